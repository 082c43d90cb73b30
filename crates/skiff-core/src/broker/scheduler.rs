use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use super::command::SchedulerCommand;
use crate::config::SchedulerConfig;
use crate::engine::QueueEngine;

/// Single-threaded scheduler core. Owns the queue engine and applies
/// commands from caller threads one at a time, so no two operations ever
/// observe or mutate the engine concurrently.
pub(super) struct Scheduler {
    engine: QueueEngine,
    inbound: Receiver<SchedulerCommand>,
    idle_timeout: Duration,
    running: bool,
}

impl Scheduler {
    pub(super) fn new(
        engine: QueueEngine,
        inbound: Receiver<SchedulerCommand>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            inbound,
            idle_timeout: Duration::from_millis(config.idle_timeout_ms),
            running: true,
        }
    }

    /// Run the scheduler event loop. This blocks the current thread until
    /// a `Shutdown` command is received or the inbound channel is disconnected.
    pub(super) fn run(&mut self) {
        info!("scheduler started");

        while self.running {
            // Phase 1: Drain all buffered commands (non-blocking)
            let mut drained = 0;
            while let Ok(cmd) = self.inbound.try_recv() {
                self.handle_command(cmd);
                drained += 1;
                if !self.running {
                    break;
                }
            }

            self.engine.record_gauges();

            if !self.running {
                break;
            }

            // Phase 2: Park until next command or timeout
            if drained == 0 {
                match self.inbound.recv_timeout(self.idle_timeout) {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        // Periodic work: reclaim leases nobody has touched
                        if self.engine.reclaim_expired_leases() > 0 {
                            self.engine.record_gauges();
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                        info!("inbound channel disconnected, shutting down");
                        self.running = false;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }

    pub(super) fn handle_command(&mut self, cmd: SchedulerCommand) {
        match cmd {
            SchedulerCommand::Enqueue {
                topic,
                payload,
                options,
                reply,
            } => {
                let _ = reply.send(self.engine.enqueue(&topic, payload, options));
            }
            SchedulerCommand::Reserve {
                topic,
                ack_timeout,
                reply,
            } => {
                let _ = reply.send(self.engine.reserve(&topic, ack_timeout));
            }
            SchedulerCommand::Ack { msg_id, reply } => {
                let _ = reply.send(self.engine.ack(&msg_id));
            }
            SchedulerCommand::Nack {
                msg_id,
                options,
                reply,
            } => {
                let _ = reply.send(self.engine.nack(&msg_id, options));
            }
            SchedulerCommand::ExtendAckDeadline {
                msg_id,
                extension,
                reply,
            } => {
                let _ = reply.send(self.engine.extend_ack_deadline(&msg_id, extension));
            }
            SchedulerCommand::Metrics { topic, reply } => {
                let _ = reply.send(self.engine.metrics(&topic));
            }
            SchedulerCommand::PendingMessages { topic, reply } => {
                let _ = reply.send(self.engine.pending_messages(topic.as_deref()));
            }
            SchedulerCommand::InflightMessages { topic, reply } => {
                let _ = reply.send(self.engine.inflight_messages(topic.as_deref()));
            }
            SchedulerCommand::DeadLetterMessages { topic, reply } => {
                let _ = reply.send(self.engine.dead_letter_messages(topic.as_deref()));
            }
            SchedulerCommand::Topics { reply } => {
                let _ = reply.send(self.engine.topics());
            }
            SchedulerCommand::PurgeTopic { topic, reply } => {
                info!(%topic, "purge topic command received");
                let _ = reply.send(self.engine.purge_topic(&topic));
            }
            SchedulerCommand::ClearAll { reply } => {
                info!("clear all command received");
                self.engine.clear_all();
                let _ = reply.send(());
            }
            SchedulerCommand::Redrive {
                topic,
                count,
                reply,
            } => {
                debug!(%topic, count, "redrive command received");
                let _ = reply.send(self.engine.redrive(&topic, count));
            }
            SchedulerCommand::ReclaimExpiredLeases { reply } => {
                let _ = reply.send(self.engine.reclaim_expired_leases());
            }
            SchedulerCommand::Shutdown => {
                info!("shutdown command received");
                self.running = false;
            }
        }
    }
}
