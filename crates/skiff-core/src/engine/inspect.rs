use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use super::{QueueEngine, QueueMetrics, TopicSummary};
use crate::error::Result;
use crate::message::{normalize_topic, DeadLetterMessage, Message};

impl QueueEngine {
    /// Counts for one topic, taken after a reclamation pass.
    pub fn metrics(&mut self, topic: &str) -> Result<QueueMetrics> {
        let topic = normalize_topic(topic)?;
        self.reclaim_expired_leases();

        let inflight = self
            .leases
            .iter()
            .filter(|(_, id)| self.messages.get(id).is_some_and(|m| m.topic == topic))
            .count() as u64;
        Ok(self.topic_metrics(&topic, inflight))
    }

    /// One summary per topic that currently holds pending, inflight or
    /// dead-lettered messages, sorted by name. Does not reclaim.
    pub fn topics(&self) -> Vec<TopicSummary> {
        let inflight_by_topic = self.inflight_counts();

        let mut names: BTreeSet<&str> = self.ready.keys().map(String::as_str).collect();
        names.extend(inflight_by_topic.keys().copied());
        names.extend(
            self.dead_letters
                .iter()
                .filter(|(_, records)| !records.is_empty())
                .map(|(name, _)| name.as_str()),
        );

        names
            .into_iter()
            .map(|name| TopicSummary {
                name: name.to_string(),
                metrics: self.topic_metrics(name, inflight_by_topic.get(name).copied().unwrap_or(0)),
            })
            .collect()
    }

    /// Pending messages in delivery order, for one topic or all of them.
    pub fn pending_messages(&self, topic: Option<&str>) -> Result<Vec<Message>> {
        let topic = topic.map(normalize_topic).transpose()?;
        Ok(self
            .ready
            .iter()
            .filter(|(name, _)| topic.as_ref().map_or(true, |t| t == *name))
            .flat_map(|(_, queue)| queue.sorted())
            .filter_map(|entry| self.messages.get(&entry.msg_id).cloned())
            .collect())
    }

    /// Inflight messages, earliest ack deadline first.
    pub fn inflight_messages(&self, topic: Option<&str>) -> Result<Vec<Message>> {
        let topic = topic.map(normalize_topic).transpose()?;
        Ok(self
            .leases
            .iter()
            .filter_map(|(_, id)| self.messages.get(&id))
            .filter(|m| topic.as_ref().map_or(true, |t| *t == m.topic))
            .cloned()
            .collect())
    }

    /// Dead-lettered messages in the order they failed, grouped by topic.
    pub fn dead_letter_messages(&self, topic: Option<&str>) -> Result<Vec<DeadLetterMessage>> {
        let topic = topic.map(normalize_topic).transpose()?;
        Ok(self
            .dead_letters
            .iter()
            .filter(|(name, _)| topic.as_ref().map_or(true, |t| t == *name))
            .flat_map(|(_, records)| records.iter().cloned())
            .collect())
    }

    /// Drop every pending, inflight and dead-lettered message of `topic`.
    /// Returns how many records were removed.
    pub fn purge_topic(&mut self, topic: &str) -> Result<usize> {
        let topic = normalize_topic(topic)?;
        let mut removed = 0;

        if let Some(queue) = self.ready.remove(&topic) {
            for msg_id in queue.into_ids() {
                if self.messages.remove(&msg_id).is_some() {
                    removed += 1;
                }
            }
        }

        let leased: Vec<_> = self
            .leases
            .iter()
            .filter(|(_, id)| self.messages.get(id).is_some_and(|m| m.topic == topic))
            .map(|(_, id)| id)
            .collect();
        for msg_id in &leased {
            self.leases.remove(msg_id);
            self.messages.remove(msg_id);
        }
        removed += leased.len();

        if let Some(records) = self.dead_letters.remove(&topic) {
            removed += records.len();
        }

        info!(%topic, removed, "topic purged");
        Ok(removed)
    }

    /// Drop all state. The insertion sequence keeps counting.
    pub fn clear_all(&mut self) {
        let removed = self.messages.len()
            + self.dead_letters.values().map(Vec::len).sum::<usize>();
        self.messages.clear();
        self.ready.clear();
        self.leases.clear();
        self.dead_letters.clear();
        info!(removed, "all topics cleared");
    }

    /// Move up to `count` dead letters of `topic` (0 = all, oldest first)
    /// back to pending with a fresh attempt budget. Returns how many moved.
    pub fn redrive(&mut self, topic: &str, count: usize) -> Result<usize> {
        let topic = normalize_topic(topic)?;
        let Some(records) = self.dead_letters.get_mut(&topic) else {
            return Ok(0);
        };

        let take = if count == 0 { records.len() } else { count.min(records.len()) };
        let moved: Vec<DeadLetterMessage> = records.drain(..take).collect();
        if records.is_empty() {
            self.dead_letters.remove(&topic);
        }

        let now = self.clock.now();
        for record in &moved {
            let message = Message {
                id: record.id,
                topic: record.topic.clone(),
                payload: record.payload.clone(),
                attempts: 0,
                max_attempts: record.max_attempts,
                created_at: record.created_at,
                available_at: now,
                ack_deadline: None,
                metadata: record.metadata.clone(),
                last_error: record.last_error.clone(),
            };
            self.push_ready(&topic, message.id, now);
            debug!(%topic, msg_id = %message.id, "dead letter redriven");
            self.messages.insert(message.id, message);
        }

        info!(%topic, redriven = moved.len(), "redrive complete");
        Ok(moved.len())
    }

    /// Publish pending, inflight and dead-letter gauges for every topic the
    /// engine has seen, including zeros for drained topics.
    pub fn record_gauges(&self) {
        let inflight_by_topic = self.inflight_counts();
        for topic in &self.known_topics {
            let pending = self.ready.get(topic).map_or(0, |q| q.len()) as u64;
            let inflight = inflight_by_topic.get(topic.as_str()).copied().unwrap_or(0);
            let dead = self.dead_letters.get(topic).map_or(0, Vec::len) as u64;
            self.metrics.set_pending(topic, pending);
            self.metrics.set_leases_active(topic, inflight);
            self.metrics.set_dead_lettered(topic, dead);
        }
    }

    fn inflight_counts(&self) -> HashMap<&str, u64> {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for (_, msg_id) in self.leases.iter() {
            if let Some(message) = self.messages.get(&msg_id) {
                *counts.entry(message.topic.as_str()).or_default() += 1;
            }
        }
        counts
    }

    fn topic_metrics(&self, topic: &str, inflight: u64) -> QueueMetrics {
        let queue = self.ready.get(topic);
        let pending = queue.map_or(0, |q| q.len()) as u64;
        QueueMetrics {
            total: pending + inflight,
            pending,
            inflight,
            dead_lettered: self.dead_letters.get(topic).map_or(0, Vec::len) as u64,
            oldest_pending_available_at: queue.and_then(|q| q.peek()).map(|e| e.available_at),
        }
    }
}
