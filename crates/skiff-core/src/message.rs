use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Timestamp;

pub type MessageId = Uuid;

/// A metadata value attached to a message at enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Core message record. The engine keeps exactly one of these per live
/// message; callers receive clones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub topic: String,
    pub payload: Vec<u8>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: Timestamp,
    pub available_at: Timestamp,
    /// Set iff the message is currently reserved.
    pub ack_deadline: Option<Timestamp>,
    pub metadata: HashMap<String, MetadataValue>,
    pub last_error: Option<String>,
}

impl Message {
    /// Generate a new UUIDv7 message ID.
    pub fn new_id() -> MessageId {
        Uuid::now_v7()
    }

    pub fn is_inflight(&self) -> bool {
        self.ack_deadline.is_some()
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Why a message ended up in the dead-letter store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeadLetterReason {
    /// Consumer nacked with `requeue = false`.
    Rejected,
    /// Consumer nacked after the last allowed attempt.
    RetriesExhausted,
    /// The lease timed out after the last allowed attempt.
    LeaseExpired,
}

/// Terminal record of a message that failed permanently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadLetterMessage {
    pub id: MessageId,
    pub topic: String,
    pub payload: Vec<u8>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub metadata: HashMap<String, MetadataValue>,
    pub created_at: Timestamp,
    pub last_error: Option<String>,
    pub failed_at: Timestamp,
    pub reason: DeadLetterReason,
}

impl DeadLetterMessage {
    pub(crate) fn from_message(
        message: Message,
        failed_at: Timestamp,
        reason: DeadLetterReason,
    ) -> Self {
        Self {
            id: message.id,
            topic: message.topic,
            payload: message.payload,
            attempts: message.attempts,
            max_attempts: message.max_attempts,
            metadata: message.metadata,
            created_at: message.created_at,
            last_error: message.last_error,
            failed_at,
            reason,
        }
    }
}

/// Trim and lower-case a topic name. Fails on names that are empty after trimming.
pub fn normalize_topic(topic: &str) -> crate::error::Result<String> {
    let normalized = topic.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(crate::error::QueueError::InvalidArgument(
            "topic must not be empty".into(),
        ));
    }
    Ok(normalized)
}
