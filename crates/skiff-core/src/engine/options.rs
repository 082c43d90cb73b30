use std::collections::HashMap;
use std::time::Duration;

use crate::message::MetadataValue;

/// Optional parameters for [`QueueEngine::enqueue`](super::QueueEngine::enqueue).
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Added to "now" to compute `available_at`.
    pub delay: Duration,
    /// Falls back to the engine default when `None`.
    pub max_attempts: Option<u32>,
    pub metadata: HashMap<String, MetadataValue>,
}

impl EnqueueOptions {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Optional parameters for [`QueueEngine::nack`](super::QueueEngine::nack).
#[derive(Debug, Clone)]
pub struct NackOptions {
    pub delay: Duration,
    pub requeue: bool,
    pub error: Option<String>,
}

impl Default for NackOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            requeue: true,
            error: None,
        }
    }
}

impl NackOptions {
    /// Nack without requeueing: the message goes straight to the dead-letter store.
    pub fn reject() -> Self {
        Self {
            requeue: false,
            ..Self::default()
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
