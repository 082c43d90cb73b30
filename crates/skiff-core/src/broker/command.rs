use std::time::Duration;

use tokio::sync::oneshot;

use crate::clock::Timestamp;
use crate::engine::{EnqueueOptions, NackOptions, QueueMetrics, TopicSummary};
use crate::error::Result;
use crate::message::{DeadLetterMessage, Message, MessageId};

/// Commands sent from caller threads to the single-threaded scheduler.
///
/// Each variant that expects a response includes a `tokio::sync::oneshot::Sender`
/// for the reply. `Shutdown` is fire-and-forget.
pub enum SchedulerCommand {
    Enqueue {
        topic: String,
        payload: Vec<u8>,
        options: EnqueueOptions,
        reply: oneshot::Sender<Result<Message>>,
    },
    Reserve {
        topic: String,
        ack_timeout: Option<Duration>,
        reply: oneshot::Sender<Result<Option<Message>>>,
    },
    Ack {
        msg_id: MessageId,
        reply: oneshot::Sender<Result<()>>,
    },
    Nack {
        msg_id: MessageId,
        options: NackOptions,
        reply: oneshot::Sender<Result<()>>,
    },
    ExtendAckDeadline {
        msg_id: MessageId,
        extension: Duration,
        reply: oneshot::Sender<Result<Timestamp>>,
    },
    Metrics {
        topic: String,
        reply: oneshot::Sender<Result<QueueMetrics>>,
    },
    PendingMessages {
        topic: Option<String>,
        reply: oneshot::Sender<Result<Vec<Message>>>,
    },
    InflightMessages {
        topic: Option<String>,
        reply: oneshot::Sender<Result<Vec<Message>>>,
    },
    DeadLetterMessages {
        topic: Option<String>,
        reply: oneshot::Sender<Result<Vec<DeadLetterMessage>>>,
    },
    Topics {
        reply: oneshot::Sender<Vec<TopicSummary>>,
    },
    PurgeTopic {
        topic: String,
        reply: oneshot::Sender<Result<usize>>,
    },
    ClearAll {
        reply: oneshot::Sender<()>,
    },
    Redrive {
        topic: String,
        count: usize,
        reply: oneshot::Sender<Result<usize>>,
    },
    ReclaimExpiredLeases {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}
