//! One-shot scheduled actions.
//!
//! Delayed effects (the stove failure sequence) are explicit records with a
//! due tick, drained during the scheduled-actions phase of each step. Entries
//! scheduled together fire independently: cancelling or completing one never
//! touches the other.

use crate::fixed::Ticks;
use crate::id::StationId;

/// A deferred effect, applied by the engine when its due tick arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Empty every slot of a stove, destroying the occupants.
    ClearStove { station: StationId },
    /// Remove the failure effect from a stove.
    ClearFireEffect { station: StationId },
}

#[derive(Debug, Clone)]
struct Entry {
    due: Ticks,
    seq: u64,
    action: ScheduledAction,
}

/// Pending one-shot actions, drained in `(due, schedule order)` order so a
/// step that fires several actions at once is deterministic.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay` ticks after `now`. A zero delay
    /// fires on the next scheduled-actions phase.
    pub fn schedule_in(&mut self, now: Ticks, delay: Ticks, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            due: now.saturating_add(delay),
            seq,
            action,
        });
    }

    /// Remove and return every action due at or before `now`, ordered by
    /// `(due, schedule order)`.
    pub fn drain_due(&mut self, now: Ticks) -> Vec<ScheduledAction> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.due <= now {
                due.push(e.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.due, e.seq));
        due.into_iter().map(|e| e.action).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
