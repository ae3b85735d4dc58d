//! Attacker-side prediction and reconciliation.
//!
//! A predicting peer evaluates the same arbiter logic as the authority, but
//! against its lagging replica, to show an outcome the instant a swing
//! connects. The provisional verdict is optimistic and cosmetic; when the
//! authoritative verdict arrives the two are reconciled, and a mismatch only
//! ever triggers a visual correction — authoritative effects are never
//! applied or reversed here.

use std::collections::HashMap;

use tracing::debug;

use combat_core::resolve::{HitEvent, Outcome, Verdict, evaluate};
use combat_core::state::{EntityId, SwingId, Timestamp};

use crate::events::ReplicationEvent;
use crate::replication::ReplicaStore;

/// How a final verdict relates to the local prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Prediction matched; nothing to correct.
    Confirmed { outcome: Outcome },
    /// Prediction was wrong. Correct the cosmetics only.
    CosmeticRollback {
        predicted: Outcome,
        actual: Outcome,
    },
}

/// Local predictor for one attacking peer.
pub struct Predictor {
    peer: EntityId,
    replicas: ReplicaStore,
    swing_counter: u32,
    pending: HashMap<SwingId, Outcome>,
}

impl Predictor {
    pub fn new(peer: EntityId) -> Self {
        Self {
            peer,
            replicas: ReplicaStore::new(),
            swing_counter: 0,
            pending: HashMap::new(),
        }
    }

    /// Feeds one replicated fact from the authority's sync stream.
    pub fn observe(&mut self, event: &ReplicationEvent) {
        self.replicas.apply(event);
    }

    pub fn replicas(&self) -> &ReplicaStore {
        &self.replicas
    }

    /// Predicts the outcome of a swing against `target` at `attack_timestamp`
    /// and builds the hit event to submit.
    ///
    /// The provisional verdict is emitted to local observers immediately;
    /// `facing` comes from the peer's own geometry, which the authority will
    /// re-derive for the final verdict.
    pub fn predict_swing(
        &mut self,
        target: EntityId,
        attack_timestamp: Timestamp,
        facing: bool,
    ) -> (HitEvent, Verdict) {
        self.swing_counter += 1;
        let swing_id = SwingId::compose(self.peer, self.swing_counter);

        // An unknown target has no replicated defensive facts; predict a
        // clean hit and let the authority correct us.
        let (outcome, parry_start) = match self.replicas.get(target) {
            Some(replica) => {
                let evaluation = evaluate(replica.defense(), attack_timestamp, facing);
                (evaluation.outcome, evaluation.parry_start)
            }
            None => (Outcome::Hit, None),
        };

        let event = HitEvent {
            swing_id,
            attacker: self.peer,
            target,
            attack_timestamp,
            declared_outcome: outcome,
            declared_parry_start: parry_start,
        };
        self.pending.insert(swing_id, outcome);

        (event, Verdict::provisional(swing_id, outcome))
    }

    /// Reconciles an authoritative verdict against the matching prediction.
    ///
    /// Returns `None` for verdicts that are not ours (other peers' swings
    /// share the broadcast topic).
    pub fn reconcile(&mut self, verdict: &Verdict) -> Option<Reconciliation> {
        let predicted = self.pending.remove(&verdict.swing_id)?;
        if predicted == verdict.outcome {
            Some(Reconciliation::Confirmed {
                outcome: verdict.outcome,
            })
        } else {
            debug!(
                target: "runtime::prediction",
                swing = %verdict.swing_id,
                %predicted,
                actual = %verdict.outcome,
                "prediction corrected"
            );
            Some(Reconciliation::CosmeticRollback {
                predicted,
                actual: verdict.outcome,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::config::CombatConfig;
    use combat_core::state::{DefensivePhase, PhaseFact, StatusKind};

    const PEER: EntityId = EntityId(7);
    const TARGET: EntityId = EntityId(8);

    fn predictor() -> Predictor {
        Predictor::new(PEER)
    }

    fn replicate_activation(predictor: &mut Predictor, start: f64) {
        let config = CombatConfig::default();
        predictor.observe(&ReplicationEvent::Phase {
            entity: TARGET,
            fact: PhaseFact::new(
                DefensivePhase::Startup,
                Timestamp(start),
                Some(Timestamp(start + config.block_startup_time)),
            ),
        });
        predictor.observe(&ReplicationEvent::Phase {
            entity: TARGET,
            fact: PhaseFact::new(
                DefensivePhase::Parry,
                Timestamp(start + config.block_startup_time),
                Some(Timestamp(start + config.parry_window_end())),
            ),
        });
    }

    #[test]
    fn predicts_parry_from_replicated_facts() {
        let mut predictor = predictor();
        replicate_activation(&mut predictor, 0.0);

        let (event, provisional) = predictor.predict_swing(TARGET, Timestamp(0.10), true);

        assert_eq!(provisional.outcome, Outcome::Parried);
        assert!(!provisional.authoritative);
        assert!(provisional.effects.is_empty());
        assert_eq!(event.declared_outcome, Outcome::Parried);
        assert_eq!(event.declared_parry_start, Some(Timestamp(0.03)));
    }

    #[test]
    fn unknown_target_predicts_hit() {
        let mut predictor = predictor();
        let (event, provisional) = predictor.predict_swing(TARGET, Timestamp(1.0), true);

        assert_eq!(provisional.outcome, Outcome::Hit);
        assert_eq!(event.declared_parry_start, None);
    }

    #[test]
    fn swing_ids_are_unique_per_peer() {
        let mut predictor = predictor();
        let (first, _) = predictor.predict_swing(TARGET, Timestamp(0.1), true);
        let (second, _) = predictor.predict_swing(TARGET, Timestamp(0.2), true);

        assert_ne!(first.swing_id, second.swing_id);
        assert_eq!(first.swing_id, SwingId::compose(PEER, 1));
    }

    #[test]
    fn reconcile_confirms_matching_outcome() {
        let mut predictor = predictor();
        replicate_activation(&mut predictor, 0.0);
        let (event, _) = predictor.predict_swing(TARGET, Timestamp(0.10), true);

        let verdict = Verdict::authoritative(event.swing_id, Outcome::Parried, Vec::new());
        assert_eq!(
            predictor.reconcile(&verdict),
            Some(Reconciliation::Confirmed {
                outcome: Outcome::Parried
            })
        );
        // A replayed verdict has nothing left to reconcile.
        assert_eq!(predictor.reconcile(&verdict), None);
    }

    #[test]
    fn reconcile_rolls_back_mismatch_cosmetically() {
        let mut predictor = predictor();
        replicate_activation(&mut predictor, 0.0);
        let (event, _) = predictor.predict_swing(TARGET, Timestamp(0.10), true);

        // Authority saw the defender shakyblocked: no parry happened.
        let verdict = Verdict::authoritative(event.swing_id, Outcome::Hit, Vec::new());
        assert_eq!(
            predictor.reconcile(&verdict),
            Some(Reconciliation::CosmeticRollback {
                predicted: Outcome::Parried,
                actual: Outcome::Hit,
            })
        );
    }

    #[test]
    fn foreign_verdicts_are_ignored() {
        let mut predictor = predictor();
        let verdict = Verdict::authoritative(SwingId(999), Outcome::Hit, Vec::new());
        assert_eq!(predictor.reconcile(&verdict), None);
    }

    #[test]
    fn autoparry_status_counts_as_parrying() {
        let mut predictor = predictor();
        predictor.observe(&ReplicationEvent::StatusApplied {
            entity: TARGET,
            kind: StatusKind::Autoparry,
            started_at: Timestamp(1.0),
            until: Some(Timestamp(1.5)),
        });

        let (_, provisional) = predictor.predict_swing(TARGET, Timestamp(1.2), true);
        assert_eq!(provisional.outcome, Outcome::Parried);
    }
}
