use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::clock::Timestamp;
use crate::message::MessageId;

/// Position of a pending message in its topic's ready queue.
///
/// Field order is the ordering: earliest `available_at` first, then the
/// engine-wide insertion sequence so equal timestamps stay FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct ReadyEntry {
    pub(super) available_at: Timestamp,
    pub(super) seq: u64,
    pub(super) msg_id: MessageId,
}

/// Min-heap of pending message ids for a single topic.
#[derive(Debug, Default)]
pub(super) struct ReadyQueue {
    heap: BinaryHeap<Reverse<ReadyEntry>>,
}

impl ReadyQueue {
    pub(super) fn push(&mut self, entry: ReadyEntry) {
        self.heap.push(Reverse(entry));
    }

    pub(super) fn peek(&self) -> Option<&ReadyEntry> {
        self.heap.peek().map(|Reverse(entry)| entry)
    }

    pub(super) fn pop(&mut self) -> Option<ReadyEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    pub(super) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in delivery order. Allocates; used by inspection only.
    pub(super) fn sorted(&self) -> Vec<ReadyEntry> {
        let mut entries: Vec<ReadyEntry> = self.heap.iter().map(|Reverse(e)| *e).collect();
        entries.sort_unstable();
        entries
    }

    pub(super) fn into_ids(self) -> impl Iterator<Item = MessageId> {
        self.heap.into_iter().map(|Reverse(entry)| entry.msg_id)
    }
}
