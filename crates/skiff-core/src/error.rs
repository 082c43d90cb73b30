use crate::message::MessageId;

/// Errors surfaced by the queue engine. Both variants are caller errors:
/// the engine never retries its own operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("message {0} is not inflight")]
    NotInflight(MessageId),
}

/// Errors from the broker's scheduler thread and command channel.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("failed to spawn scheduler thread: {0}")]
    SchedulerSpawn(String),

    #[error("scheduler thread panicked")]
    SchedulerPanicked,

    #[error("scheduler command channel is full")]
    ChannelFull,

    #[error("scheduler command channel disconnected")]
    ChannelDisconnected,

    #[error("scheduler dropped the reply channel")]
    ReplyDropped,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
