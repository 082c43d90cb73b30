use crate::clock::Timestamp;

/// Point-in-time counts for a single topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Live messages: `pending + inflight`.
    pub total: u64,
    pub pending: u64,
    pub inflight: u64,
    pub dead_lettered: u64,
    pub oldest_pending_available_at: Option<Timestamp>,
}

/// One row of [`QueueEngine::topics`](super::QueueEngine::topics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub name: String,
    pub metrics: QueueMetrics,
}
