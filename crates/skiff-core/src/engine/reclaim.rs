use std::time::Duration;

use tracing::{debug, info};

use super::{Failure, QueueEngine};
use crate::clock::Timestamp;

/// `last_error` recorded when a lease times out without an ack or nack.
pub const LEASE_EXPIRED_ERROR: &str = "lease expired: ack deadline passed without ack or nack";

impl QueueEngine {
    /// Reclaim every lease whose ack deadline has passed. Each one is handled
    /// like `nack(requeue = true)` with [`LEASE_EXPIRED_ERROR`]; messages on
    /// their last attempt are dead-lettered instead.
    ///
    /// Returns the number of leases reclaimed.
    pub fn reclaim_expired_leases(&mut self) -> usize {
        let now = self.clock.now();
        self.reclaim_expired_at(now)
    }

    pub(super) fn reclaim_expired_at(&mut self, now: Timestamp) -> usize {
        let expired = self.leases.expired(now);
        if expired.is_empty() {
            return 0;
        }

        for msg_id in &expired {
            self.leases.remove(msg_id);
            if let Some(message) = self.messages.get(msg_id) {
                self.metrics.record_lease_expired(&message.topic);
                debug!(
                    topic = %message.topic,
                    %msg_id,
                    attempts = message.attempts,
                    "reclaiming expired lease"
                );
            }
            self.fail(
                msg_id,
                now,
                Duration::ZERO,
                Some(LEASE_EXPIRED_ERROR.to_string()),
                Failure::LeaseExpired,
            );
        }

        info!(reclaimed = expired.len(), "reclaimed expired leases");
        expired.len()
    }
}
