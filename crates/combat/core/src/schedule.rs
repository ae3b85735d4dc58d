//! Deadline-keyed transition scheduler.
//!
//! Every timed phase change is a `(entity, kind, deadline)` entry in a
//! priority queue, polled by the authoritative tick — no component ever
//! blocks waiting for time to pass. Cancellation is by key so a superseded
//! or destroyed entity's deadlines can be dropped without chasing stale
//! closures; stale heap entries are discarded lazily on pop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::state::{EntityId, Timestamp};

/// Kinds of scheduled transitions. One deadline may be pending per
/// `(entity, kind)` pair at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    /// Startup complete: open the parry window (or the shakyblock gap).
    EnterParry,
    /// Parry window over: enter the failed-parry gap.
    EnterParryGap,
    /// Gap over: settle into block, or cooldown if the hold was released.
    EnterBlock,
    /// Cooldown over: return to idle.
    FinishCooldown,
    /// Guardbreak expired: the machine becomes engageable again.
    GuardbreakExpiry,
    /// Knockdown over: run the recovery sequence.
    KnockdownRecovery,
}

impl TransitionKind {
    /// The defensive-machine transitions, superseded as a group when the
    /// machine is overridden by guardbreak or knockdown.
    pub const MACHINE: [TransitionKind; 4] = [
        TransitionKind::EnterParry,
        TransitionKind::EnterParryGap,
        TransitionKind::EnterBlock,
        TransitionKind::FinishCooldown,
    ];
}

/// A due transition popped from the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    pub entity: EntityId,
    pub kind: TransitionKind,
    pub at: Timestamp,
}

/// Priority queue of pending transitions with O(1) cancellation by key.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<(Timestamp, EntityId, TransitionKind)>>,
    pending: HashMap<(EntityId, TransitionKind), Timestamp>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a transition, replacing any pending deadline for the same
    /// `(entity, kind)` key.
    pub fn schedule(&mut self, entity: EntityId, kind: TransitionKind, at: Timestamp) {
        self.pending.insert((entity, kind), at);
        self.queue.push(Reverse((at, entity, kind)));
    }

    /// Cancels the pending deadline for a key, if any. The heap entry is
    /// dropped lazily.
    pub fn cancel(&mut self, entity: EntityId, kind: TransitionKind) {
        self.pending.remove(&(entity, kind));
    }

    /// Cancels every pending deadline for an entity. Must be called before
    /// the entity is destroyed.
    pub fn cancel_entity(&mut self, entity: EntityId) {
        self.pending.retain(|&(id, _), _| id != entity);
    }

    pub fn is_scheduled(&self, entity: EntityId, kind: TransitionKind) -> bool {
        self.pending.contains_key(&(entity, kind))
    }

    /// Pops the next transition due at or before `now`, in deadline order.
    /// Entries whose key was cancelled or rescheduled are skipped.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<Deadline> {
        while let Some(Reverse((at, entity, kind))) = self.queue.peek().copied() {
            if at > now {
                return None;
            }
            self.queue.pop();
            match self.pending.get(&(entity, kind)) {
                Some(&current) if current == at => {
                    self.pending.remove(&(entity, kind));
                    return Some(Deadline { entity, kind, at });
                }
                // Stale: cancelled, or rescheduled to a different deadline.
                _ => continue,
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EntityId = EntityId(1);
    const B: EntityId = EntityId(2);

    #[test]
    fn pops_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.schedule(A, TransitionKind::EnterBlock, Timestamp(0.5));
        sched.schedule(B, TransitionKind::EnterParry, Timestamp(0.03));

        let first = sched.pop_due(Timestamp(1.0)).unwrap();
        assert_eq!((first.entity, first.kind), (B, TransitionKind::EnterParry));
        let second = sched.pop_due(Timestamp(1.0)).unwrap();
        assert_eq!((second.entity, second.kind), (A, TransitionKind::EnterBlock));
        assert!(sched.pop_due(Timestamp(1.0)).is_none());
    }

    #[test]
    fn future_deadlines_stay_queued() {
        let mut sched = Scheduler::new();
        sched.schedule(A, TransitionKind::FinishCooldown, Timestamp(2.0));

        assert!(sched.pop_due(Timestamp(1.9)).is_none());
        assert!(sched.is_scheduled(A, TransitionKind::FinishCooldown));
        assert!(sched.pop_due(Timestamp(2.0)).is_some());
    }

    #[test]
    fn cancelled_key_is_never_popped() {
        let mut sched = Scheduler::new();
        sched.schedule(A, TransitionKind::EnterBlock, Timestamp(0.5));
        sched.cancel(A, TransitionKind::EnterBlock);

        assert!(sched.pop_due(Timestamp(10.0)).is_none());
    }

    #[test]
    fn reschedule_supersedes_old_deadline() {
        let mut sched = Scheduler::new();
        sched.schedule(A, TransitionKind::EnterBlock, Timestamp(0.5));
        sched.schedule(A, TransitionKind::EnterBlock, Timestamp(0.8));

        let fired = sched.pop_due(Timestamp(10.0)).unwrap();
        assert_eq!(fired.at, Timestamp(0.8));
        assert!(sched.pop_due(Timestamp(10.0)).is_none());
    }

    #[test]
    fn cancel_entity_clears_all_keys() {
        let mut sched = Scheduler::new();
        sched.schedule(A, TransitionKind::EnterParry, Timestamp(0.1));
        sched.schedule(A, TransitionKind::KnockdownRecovery, Timestamp(6.0));
        sched.schedule(B, TransitionKind::EnterParry, Timestamp(0.2));
        sched.cancel_entity(A);

        let fired = sched.pop_due(Timestamp(10.0)).unwrap();
        assert_eq!(fired.entity, B);
        assert!(sched.pop_due(Timestamp(10.0)).is_none());
    }
}
