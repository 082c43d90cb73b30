pub mod broker;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod metrics;
pub mod telemetry;

pub use broker::{Broker, SchedulerCommand};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{BrokerConfig, EngineConfig, SchedulerConfig};
pub use engine::{EnqueueOptions, NackOptions, QueueEngine, QueueMetrics, TopicSummary};
pub use error::{BrokerError, BrokerResult, ConfigError, QueueError, Result};
pub use message::{DeadLetterMessage, DeadLetterReason, Message, MessageId, MetadataValue};
