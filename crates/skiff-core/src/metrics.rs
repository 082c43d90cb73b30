use opentelemetry::metrics::{Counter, Gauge, Meter};
use opentelemetry::KeyValue;

use crate::message::DeadLetterReason;

/// OTel instruments for the queue engine. Created once per engine and used
/// to record counters on each state transition and gauges after each batch
/// of commands.
pub struct Metrics {
    pub messages_enqueued: Counter<u64>,
    pub messages_reserved: Counter<u64>,
    pub messages_acked: Counter<u64>,
    pub messages_nacked: Counter<u64>,
    pub messages_dead_lettered: Counter<u64>,
    pub leases_expired: Counter<u64>,
    pub queue_pending: Gauge<u64>,
    pub leases_active: Gauge<u64>,
    pub queue_dead_lettered: Gauge<u64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create metrics from the global meter provider. If no meter provider
    /// is configured, the instruments are no-op.
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("skiff");
        Self::from_meter(&meter)
    }

    /// Create metrics from a specific meter (used in tests with in-memory exporter).
    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            messages_enqueued: meter
                .u64_counter("skiff.messages.enqueued")
                .with_description("Total messages enqueued")
                .build(),
            messages_reserved: meter
                .u64_counter("skiff.messages.reserved")
                .with_description("Total successful reservations")
                .build(),
            messages_acked: meter
                .u64_counter("skiff.messages.acked")
                .with_description("Total messages acknowledged")
                .build(),
            messages_nacked: meter
                .u64_counter("skiff.messages.nacked")
                .with_description("Total explicit negative acknowledgements")
                .build(),
            messages_dead_lettered: meter
                .u64_counter("skiff.messages.dead_lettered")
                .with_description("Total messages moved to the dead-letter store")
                .build(),
            leases_expired: meter
                .u64_counter("skiff.leases.expired")
                .with_description("Total leases reclaimed after their ack deadline")
                .build(),
            queue_pending: meter
                .u64_gauge("skiff.queue.pending")
                .with_description("Current pending (reservable or delayed) messages")
                .build(),
            leases_active: meter
                .u64_gauge("skiff.leases.active")
                .with_description("Current active leases")
                .build(),
            queue_dead_lettered: meter
                .u64_gauge("skiff.queue.dead_lettered")
                .with_description("Current dead-lettered messages")
                .build(),
        }
    }

    pub fn record_enqueue(&self, topic: &str) {
        self.messages_enqueued.add(1, &[topic_attr(topic)]);
    }

    pub fn record_reserve(&self, topic: &str) {
        self.messages_reserved.add(1, &[topic_attr(topic)]);
    }

    pub fn record_ack(&self, topic: &str) {
        self.messages_acked.add(1, &[topic_attr(topic)]);
    }

    pub fn record_nack(&self, topic: &str) {
        self.messages_nacked.add(1, &[topic_attr(topic)]);
    }

    pub fn record_dead_letter(&self, topic: &str, reason: DeadLetterReason) {
        let reason = match reason {
            DeadLetterReason::Rejected => "rejected",
            DeadLetterReason::RetriesExhausted => "retries_exhausted",
            DeadLetterReason::LeaseExpired => "lease_expired",
        };
        self.messages_dead_lettered
            .add(1, &[topic_attr(topic), KeyValue::new("reason", reason)]);
    }

    pub fn record_lease_expired(&self, topic: &str) {
        self.leases_expired.add(1, &[topic_attr(topic)]);
    }

    pub fn set_pending(&self, topic: &str, count: u64) {
        self.queue_pending.record(count, &[topic_attr(topic)]);
    }

    pub fn set_leases_active(&self, topic: &str, count: u64) {
        self.leases_active.record(count, &[topic_attr(topic)]);
    }

    pub fn set_dead_lettered(&self, topic: &str, count: u64) {
        self.queue_dead_lettered.record(count, &[topic_attr(topic)]);
    }
}

fn topic_attr(topic: &str) -> KeyValue {
    KeyValue::new("topic", topic.to_string())
}
