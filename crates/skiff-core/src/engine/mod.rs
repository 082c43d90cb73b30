use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::{self, Clock, Timestamp};
use crate::config::EngineConfig;
use crate::error::{ConfigError, QueueError, Result};
use crate::message::{
    normalize_topic, DeadLetterMessage, DeadLetterReason, Message, MessageId,
};
use crate::metrics::Metrics;

mod inspect;
mod leases;
mod options;
mod ready;
mod reclaim;
mod stats;

pub use options::{EnqueueOptions, NackOptions};
pub use reclaim::LEASE_EXPIRED_ERROR;
pub use stats::{QueueMetrics, TopicSummary};

use leases::LeaseRegistry;
use ready::{ReadyEntry, ReadyQueue};

/// How an inflight message came to fail.
#[derive(Debug, Clone, Copy)]
enum Failure {
    Nacked { requeue: bool },
    LeaseExpired,
}

/// In-process queue engine. Owns the message store, the per-topic ready
/// queues, the inflight registry and the dead-letter store; every message id
/// lives in exactly one of them at a time.
///
/// Methods take `&mut self`, so a single engine is serialized by the borrow
/// checker. Share one across threads through [`crate::Broker`].
pub struct QueueEngine {
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    messages: HashMap<MessageId, Message>,
    ready: BTreeMap<String, ReadyQueue>,
    leases: LeaseRegistry,
    dead_letters: BTreeMap<String, Vec<DeadLetterMessage>>,
    /// Every topic ever enqueued to, so gauges drop to zero once a topic drains.
    known_topics: BTreeSet<String>,
    /// Tiebreaker for equal `available_at`. Never reset, not even by `clear_all`.
    next_seq: u64,
    metrics: Metrics,
}

impl QueueEngine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> std::result::Result<Self, ConfigError> {
        Self::with_metrics(config, clock, Metrics::new())
    }

    pub fn with_metrics(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            clock,
            config,
            messages: HashMap::new(),
            ready: BTreeMap::new(),
            leases: LeaseRegistry::default(),
            dead_letters: BTreeMap::new(),
            known_topics: BTreeSet::new(),
            next_seq: 0,
            metrics,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn enqueue(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        options: EnqueueOptions,
    ) -> Result<Message> {
        let topic = normalize_topic(topic)?;
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.config.default_max_attempts);
        if max_attempts == 0 {
            return Err(QueueError::InvalidArgument(
                "max_attempts must be at least 1".into(),
            ));
        }

        let now = self.clock.now();
        let message = Message {
            id: Message::new_id(),
            topic,
            payload,
            attempts: 0,
            max_attempts,
            created_at: now,
            available_at: clock::after(now, options.delay),
            ack_deadline: None,
            metadata: options.metadata,
            last_error: None,
        };

        self.push_ready(&message.topic, message.id, message.available_at);
        if !self.known_topics.contains(&message.topic) {
            self.known_topics.insert(message.topic.clone());
        }
        self.metrics.record_enqueue(&message.topic);
        debug!(
            topic = %message.topic,
            msg_id = %message.id,
            available_at = message.available_at,
            max_attempts,
            "message enqueued"
        );

        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    /// Lease the earliest eligible message of `topic`, or `None` if nothing
    /// is eligible yet. Expired leases are reclaimed first.
    pub fn reserve(&mut self, topic: &str, ack_timeout: Option<Duration>) -> Result<Option<Message>> {
        let topic = normalize_topic(topic)?;
        let ack_timeout = match ack_timeout {
            // Timestamps have millisecond resolution
            Some(timeout) if timeout.as_millis() == 0 => {
                return Err(QueueError::InvalidArgument(
                    "ack_timeout must be at least 1ms".into(),
                ));
            }
            Some(timeout) => timeout,
            None => self.config.default_ack_timeout(),
        };

        let now = self.clock.now();
        self.reclaim_expired_at(now);

        let Some(msg_id) = self.pop_eligible(&topic, now) else {
            return Ok(None);
        };
        let Some(message) = self.messages.get_mut(&msg_id) else {
            // pop_eligible only yields ids present in the store
            return Ok(None);
        };

        let deadline = clock::after(now, ack_timeout);
        message.attempts += 1;
        message.ack_deadline = Some(deadline);
        self.leases.insert(msg_id, deadline);
        self.metrics.record_reserve(&topic);
        debug!(
            %topic,
            %msg_id,
            attempts = message.attempts,
            ack_deadline = deadline,
            "message reserved"
        );

        Ok(Some(message.clone()))
    }

    /// Permanently remove an inflight message.
    pub fn ack(&mut self, msg_id: &MessageId) -> Result<()> {
        if self.leases.remove(msg_id).is_none() {
            return Err(QueueError::NotInflight(*msg_id));
        }
        if let Some(message) = self.messages.remove(msg_id) {
            self.metrics.record_ack(&message.topic);
            debug!(topic = %message.topic, %msg_id, attempts = message.attempts, "message acked");
        } else {
            warn!(%msg_id, "lease had no backing message");
        }
        Ok(())
    }

    /// Return an inflight message for retry, or dead-letter it when
    /// `requeue` is false or its attempts are used up.
    pub fn nack(&mut self, msg_id: &MessageId, options: NackOptions) -> Result<()> {
        if self.leases.remove(msg_id).is_none() {
            return Err(QueueError::NotInflight(*msg_id));
        }
        if let Some(topic) = self.messages.get(msg_id).map(|m| m.topic.clone()) {
            self.metrics.record_nack(&topic);
        }

        let now = self.clock.now();
        self.fail(
            msg_id,
            now,
            options.delay,
            options.error,
            Failure::Nacked {
                requeue: options.requeue,
            },
        );
        Ok(())
    }

    /// Push an inflight message's deadline forward by `extension`. Returns
    /// the new deadline.
    pub fn extend_ack_deadline(&mut self, msg_id: &MessageId, extension: Duration) -> Result<Timestamp> {
        if extension.as_millis() == 0 {
            return Err(QueueError::InvalidArgument(
                "extension must be at least 1ms".into(),
            ));
        }
        let Some(current) = self.leases.deadline(msg_id) else {
            return Err(QueueError::NotInflight(*msg_id));
        };
        let Some(message) = self.messages.get_mut(msg_id) else {
            self.leases.remove(msg_id);
            warn!(%msg_id, "dropped lease with no backing message");
            return Err(QueueError::NotInflight(*msg_id));
        };

        let deadline = clock::after(current, extension);
        message.ack_deadline = Some(deadline);
        self.leases.insert(*msg_id, deadline);
        debug!(topic = %message.topic, %msg_id, ack_deadline = deadline, "ack deadline extended");
        Ok(deadline)
    }

    /// Settle a message whose lease has already been removed: requeue it,
    /// or move it to the dead-letter store.
    fn fail(
        &mut self,
        msg_id: &MessageId,
        now: Timestamp,
        delay: Duration,
        error: Option<String>,
        failure: Failure,
    ) {
        let Some(message) = self.messages.get_mut(msg_id) else {
            warn!(%msg_id, "failed lease had no backing message");
            return;
        };
        if let Some(error) = error {
            message.last_error = Some(error);
        }
        message.ack_deadline = None;

        let requeue = match failure {
            Failure::Nacked { requeue } => requeue,
            Failure::LeaseExpired => true,
        };

        if requeue && !message.attempts_exhausted() {
            message.available_at = clock::after(now, delay);
            let (topic, available_at) = (message.topic.clone(), message.available_at);
            debug!(
                %topic,
                %msg_id,
                attempts = message.attempts,
                available_at,
                "message requeued"
            );
            self.push_ready(&topic, *msg_id, available_at);
            return;
        }

        let reason = match failure {
            Failure::Nacked { requeue: false } => DeadLetterReason::Rejected,
            Failure::Nacked { requeue: true } => DeadLetterReason::RetriesExhausted,
            Failure::LeaseExpired => DeadLetterReason::LeaseExpired,
        };
        if let Some(message) = self.messages.remove(msg_id) {
            self.dead_letter(message, now, reason);
        }
    }

    fn dead_letter(&mut self, message: Message, now: Timestamp, reason: DeadLetterReason) {
        warn!(
            topic = %message.topic,
            msg_id = %message.id,
            attempts = message.attempts,
            max_attempts = message.max_attempts,
            last_error = message.last_error.as_deref().unwrap_or(""),
            ?reason,
            "message dead-lettered"
        );
        self.metrics.record_dead_letter(&message.topic, reason);
        let record = DeadLetterMessage::from_message(message, now, reason);
        self.dead_letters
            .entry(record.topic.clone())
            .or_default()
            .push(record);
    }

    fn push_ready(&mut self, topic: &str, msg_id: MessageId, available_at: Timestamp) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ready.entry(topic.to_string()).or_default().push(ReadyEntry {
            available_at,
            seq,
            msg_id,
        });
    }

    /// Pop the head of `topic`'s ready queue if it is due. Entries whose
    /// message has vanished from the store are discarded.
    fn pop_eligible(&mut self, topic: &str, now: Timestamp) -> Option<MessageId> {
        let queue = self.ready.get_mut(topic)?;
        let mut found = None;
        while let Some(head) = queue.peek() {
            if head.available_at > now {
                break;
            }
            let msg_id = head.msg_id;
            queue.pop();
            if self.messages.contains_key(&msg_id) {
                found = Some(msg_id);
                break;
            }
            warn!(%topic, %msg_id, "discarding ready entry with no backing message");
        }
        if queue.is_empty() {
            self.ready.remove(topic);
        }
        found
    }
}

#[cfg(test)]
mod tests;
