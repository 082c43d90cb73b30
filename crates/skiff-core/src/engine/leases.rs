use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::clock::Timestamp;
use crate::message::MessageId;

/// Inflight registry: the active lease of every reserved message, plus an
/// index ordered by deadline so expiry scans stop at the first live lease.
#[derive(Debug, Default)]
pub(super) struct LeaseRegistry {
    deadlines: HashMap<MessageId, Timestamp>,
    by_deadline: BTreeSet<(Timestamp, MessageId)>,
}

impl LeaseRegistry {
    pub(super) fn insert(&mut self, msg_id: MessageId, deadline: Timestamp) {
        if let Some(previous) = self.deadlines.insert(msg_id, deadline) {
            self.by_deadline.remove(&(previous, msg_id));
        }
        self.by_deadline.insert((deadline, msg_id));
    }

    /// Drop a lease, returning its deadline if one existed.
    pub(super) fn remove(&mut self, msg_id: &MessageId) -> Option<Timestamp> {
        let deadline = self.deadlines.remove(msg_id)?;
        self.by_deadline.remove(&(deadline, *msg_id));
        Some(deadline)
    }

    pub(super) fn deadline(&self, msg_id: &MessageId) -> Option<Timestamp> {
        self.deadlines.get(msg_id).copied()
    }

    #[cfg(test)]
    pub(super) fn contains(&self, msg_id: &MessageId) -> bool {
        self.deadlines.contains_key(msg_id)
    }

    /// Ids whose deadline is at or before `now`, earliest first.
    pub(super) fn expired(&self, now: Timestamp) -> Vec<MessageId> {
        self.by_deadline
            .range(..=(now, Uuid::max()))
            .map(|(_, id)| *id)
            .collect()
    }

    /// All leases, earliest deadline first.
    pub(super) fn iter(&self) -> impl Iterator<Item = (Timestamp, MessageId)> + '_ {
        self.by_deadline.iter().copied()
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub(super) fn clear(&mut self) {
        self.deadlines.clear();
        self.by_deadline.clear();
    }
}
