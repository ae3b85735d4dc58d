//! Replica state rebuilt from the authority's sync stream.
//!
//! A predicting peer never sees [`combat_core::state::CombatState`]; it
//! consumes [`ReplicationEvent`]s and maintains, per entity, just enough
//! facts to run the arbiter's evaluation locally: the phase timeline, the
//! status set, posture, and the immunity expiry. Replicas always lag the
//! authority by network delay, which is exactly what the timestamp-tolerant
//! validation on the authority accounts for.

use std::collections::HashMap;

use combat_core::resolve::DefenseView;
use combat_core::state::{EntityId, StatusEffects, Timeline, Timestamp};

use crate::events::ReplicationEvent;

/// One entity's replicated facts.
#[derive(Clone, Debug, Default)]
pub struct ReplicaView {
    pub timeline: Timeline,
    pub statuses: StatusEffects,
    pub posture_current: f32,
    pub posture_max: f32,
    pub immunity_until: Option<Timestamp>,
}

impl ReplicaView {
    /// Read-only view for the arbiter's evaluation.
    pub fn defense(&self) -> DefenseView<'_> {
        DefenseView {
            timeline: &self.timeline,
            statuses: &self.statuses,
        }
    }
}

/// Store of replicated entity facts, keyed by id.
#[derive(Debug, Default)]
pub struct ReplicaStore {
    replicas: HashMap<EntityId, ReplicaView>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one sync message.
    pub fn apply(&mut self, event: &ReplicationEvent) {
        match *event {
            ReplicationEvent::Phase { entity, fact } => {
                self.replicas.entry(entity).or_default().timeline.record(fact);
            }
            ReplicationEvent::Posture {
                entity,
                current,
                max,
            } => {
                let replica = self.replicas.entry(entity).or_default();
                replica.posture_current = current;
                replica.posture_max = max;
            }
            ReplicationEvent::StatusApplied {
                entity,
                kind,
                started_at,
                until,
            } => {
                self.replicas
                    .entry(entity)
                    .or_default()
                    .statuses
                    .add(kind, started_at, until);
            }
            ReplicationEvent::StatusEnded { entity, kind } => {
                if let Some(replica) = self.replicas.get_mut(&entity) {
                    replica.statuses.remove(kind);
                }
            }
            ReplicationEvent::Immunity { entity, until } => {
                self.replicas.entry(entity).or_default().immunity_until = until;
            }
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<&ReplicaView> {
        self.replicas.get(&entity)
    }

    /// Drops an entity's replica when it leaves the match.
    pub fn forget(&mut self, entity: EntityId) {
        self.replicas.remove(&entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::state::{DefensivePhase, PhaseFact, StatusKind};

    const ENTITY: EntityId = EntityId(3);

    #[test]
    fn rebuilds_facts_from_sync_stream() {
        let mut store = ReplicaStore::new();
        store.apply(&ReplicationEvent::Phase {
            entity: ENTITY,
            fact: PhaseFact::new(
                DefensivePhase::Startup,
                Timestamp(1.0),
                Some(Timestamp(1.03)),
            ),
        });
        store.apply(&ReplicationEvent::Posture {
            entity: ENTITY,
            current: 35.0,
            max: 100.0,
        });
        store.apply(&ReplicationEvent::StatusApplied {
            entity: ENTITY,
            kind: StatusKind::Shakyblock,
            started_at: Timestamp(1.0),
            until: Some(Timestamp(1.8)),
        });

        let replica = store.get(ENTITY).unwrap();
        assert_eq!(
            replica.timeline.phase_at(Timestamp(1.01)).phase,
            DefensivePhase::Startup
        );
        assert_eq!(replica.posture_current, 35.0);
        assert!(replica.statuses.has(StatusKind::Shakyblock, Timestamp(1.5)));
    }

    #[test]
    fn status_end_and_forget_drop_state() {
        let mut store = ReplicaStore::new();
        store.apply(&ReplicationEvent::StatusApplied {
            entity: ENTITY,
            kind: StatusKind::Blocking,
            started_at: Timestamp(0.0),
            until: None,
        });
        store.apply(&ReplicationEvent::StatusEnded {
            entity: ENTITY,
            kind: StatusKind::Blocking,
        });
        assert!(
            !store
                .get(ENTITY)
                .unwrap()
                .statuses
                .has(StatusKind::Blocking, Timestamp(1.0))
        );

        store.forget(ENTITY);
        assert!(store.get(ENTITY).is_none());
    }
}
