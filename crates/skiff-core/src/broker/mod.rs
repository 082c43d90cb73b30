mod command;
mod scheduler;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::info;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::BrokerConfig;
use crate::engine::{EnqueueOptions, NackOptions, QueueEngine, QueueMetrics, TopicSummary};
use crate::error::{BrokerError, BrokerResult};
use crate::message::{DeadLetterMessage, Message, MessageId};

pub use command::SchedulerCommand;

use scheduler::Scheduler;

/// Thread-safe front end for a [`QueueEngine`].
///
/// The broker owns a scheduler thread and the inbound command channel.
/// Callers send commands through `send_command()` (or the typed async
/// methods), and the single-threaded scheduler applies them in arrival order.
/// `Broker` is `Send + Sync`; share it behind an `Arc`.
pub struct Broker {
    command_tx: crossbeam_channel::Sender<SchedulerCommand>,
    scheduler_thread: Option<thread::JoinHandle<()>>,
}

impl Broker {
    /// Create a new broker, spawning the scheduler on a dedicated OS thread.
    #[tracing::instrument(skip_all, fields(capacity = config.scheduler.command_channel_capacity))]
    pub fn new(config: BrokerConfig, clock: Arc<dyn Clock>) -> BrokerResult<Self> {
        config.validate()?;
        let engine = QueueEngine::new(config.engine.clone(), clock)?;

        let (tx, rx) = crossbeam_channel::bounded::<SchedulerCommand>(
            config.scheduler.command_channel_capacity,
        );
        let scheduler_config = config.scheduler.clone();

        let handle = thread::Builder::new()
            .name("skiff-scheduler".to_string())
            .spawn(move || {
                let mut scheduler = Scheduler::new(engine, rx, &scheduler_config);
                scheduler.run();
            })
            .map_err(|e| BrokerError::SchedulerSpawn(e.to_string()))?;

        info!("broker started");

        Ok(Self {
            command_tx: tx,
            scheduler_thread: Some(handle),
        })
    }

    /// Create a broker driven by the wall clock.
    pub fn with_system_clock(config: BrokerConfig) -> BrokerResult<Self> {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Send a command to the scheduler. Returns an error if the channel is full
    /// or disconnected.
    #[tracing::instrument(skip_all)]
    pub fn send_command(&self, cmd: SchedulerCommand) -> BrokerResult<()> {
        self.command_tx.try_send(cmd).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(_) => BrokerError::ChannelFull,
            crossbeam_channel::TrySendError::Disconnected(_) => BrokerError::ChannelDisconnected,
        })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> BrokerResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send_command(build(reply))?;
        rx.await.map_err(|_| BrokerError::ReplyDropped)
    }

    pub async fn enqueue(
        &self,
        topic: impl Into<String>,
        payload: Vec<u8>,
        options: EnqueueOptions,
    ) -> BrokerResult<Message> {
        let topic = topic.into();
        Ok(self
            .request(|reply| SchedulerCommand::Enqueue {
                topic,
                payload,
                options,
                reply,
            })
            .await??)
    }

    pub async fn reserve(
        &self,
        topic: impl Into<String>,
        ack_timeout: Option<Duration>,
    ) -> BrokerResult<Option<Message>> {
        let topic = topic.into();
        Ok(self
            .request(|reply| SchedulerCommand::Reserve {
                topic,
                ack_timeout,
                reply,
            })
            .await??)
    }

    pub async fn ack(&self, msg_id: MessageId) -> BrokerResult<()> {
        Ok(self
            .request(|reply| SchedulerCommand::Ack { msg_id, reply })
            .await??)
    }

    pub async fn nack(&self, msg_id: MessageId, options: NackOptions) -> BrokerResult<()> {
        Ok(self
            .request(|reply| SchedulerCommand::Nack {
                msg_id,
                options,
                reply,
            })
            .await??)
    }

    pub async fn extend_ack_deadline(
        &self,
        msg_id: MessageId,
        extension: Duration,
    ) -> BrokerResult<Timestamp> {
        Ok(self
            .request(|reply| SchedulerCommand::ExtendAckDeadline {
                msg_id,
                extension,
                reply,
            })
            .await??)
    }

    pub async fn metrics(&self, topic: impl Into<String>) -> BrokerResult<QueueMetrics> {
        let topic = topic.into();
        Ok(self
            .request(|reply| SchedulerCommand::Metrics { topic, reply })
            .await??)
    }

    pub async fn pending_messages(&self, topic: Option<&str>) -> BrokerResult<Vec<Message>> {
        let topic = topic.map(str::to_string);
        Ok(self
            .request(|reply| SchedulerCommand::PendingMessages { topic, reply })
            .await??)
    }

    pub async fn inflight_messages(&self, topic: Option<&str>) -> BrokerResult<Vec<Message>> {
        let topic = topic.map(str::to_string);
        Ok(self
            .request(|reply| SchedulerCommand::InflightMessages { topic, reply })
            .await??)
    }

    pub async fn dead_letter_messages(
        &self,
        topic: Option<&str>,
    ) -> BrokerResult<Vec<DeadLetterMessage>> {
        let topic = topic.map(str::to_string);
        Ok(self
            .request(|reply| SchedulerCommand::DeadLetterMessages { topic, reply })
            .await??)
    }

    pub async fn topics(&self) -> BrokerResult<Vec<TopicSummary>> {
        self.request(|reply| SchedulerCommand::Topics { reply })
            .await
    }

    pub async fn purge_topic(&self, topic: impl Into<String>) -> BrokerResult<usize> {
        let topic = topic.into();
        Ok(self
            .request(|reply| SchedulerCommand::PurgeTopic { topic, reply })
            .await??)
    }

    pub async fn clear_all(&self) -> BrokerResult<()> {
        self.request(|reply| SchedulerCommand::ClearAll { reply })
            .await
    }

    pub async fn redrive(&self, topic: impl Into<String>, count: usize) -> BrokerResult<usize> {
        let topic = topic.into();
        Ok(self
            .request(|reply| SchedulerCommand::Redrive {
                topic,
                count,
                reply,
            })
            .await??)
    }

    pub async fn reclaim_expired_leases(&self) -> BrokerResult<usize> {
        self.request(|reply| SchedulerCommand::ReclaimExpiredLeases { reply })
            .await
    }

    /// Initiate graceful shutdown: send the shutdown command and wait for the
    /// scheduler thread to finish. Commands queued before it are still applied.
    #[tracing::instrument(skip_all)]
    pub fn shutdown(mut self) -> BrokerResult<()> {
        info!("initiating broker shutdown");

        // Ignore the error if the channel is already closed
        let _ = self.command_tx.send(SchedulerCommand::Shutdown);

        if let Some(handle) = self.scheduler_thread.take() {
            handle.join().map_err(|_| BrokerError::SchedulerPanicked)?;
        }

        info!("broker shutdown complete");
        Ok(())
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        // If shutdown wasn't called explicitly, attempt to stop the scheduler
        if self.scheduler_thread.is_some() {
            let _ = self.command_tx.send(SchedulerCommand::Shutdown);
            if let Some(handle) = self.scheduler_thread.take() {
                let _ = handle.join();
            }
        }
    }
}
