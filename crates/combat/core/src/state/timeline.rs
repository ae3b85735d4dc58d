//! Per-combatant phase timeline.
//!
//! The defensive machine does not poll wall clocks; each transition appends a
//! `(phase, entered_at, until)` fact stamped with the *scheduled* deadline, so
//! the timeline is a replicable sequence from which any reader — the
//! authority or a lagging peer — can reconstruct which phase a combatant was
//! logically in at an arbitrary past timestamp.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::Timestamp;

/// Phases of the defensive state machine, in nominal order.
///
/// `Idle → Startup → Parry → FailedParryGap → Block → Cooldown → Idle`.
/// A shakyblock override skips `Parry` entirely; a guardbreak forces the
/// machine back to `Idle` out of band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefensivePhase {
    Idle,
    Startup,
    Parry,
    FailedParryGap,
    Block,
    Cooldown,
}

/// One timeline fact: a phase entry with its scheduled end.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseFact {
    pub phase: DefensivePhase,
    pub entered_at: Timestamp,
    /// Scheduled end of this phase. `None` for unbounded phases (Idle, held
    /// Block). A recorded successor fact supersedes this value.
    pub until: Option<Timestamp>,
}

impl PhaseFact {
    pub fn new(phase: DefensivePhase, entered_at: Timestamp, until: Option<Timestamp>) -> Self {
        Self {
            phase,
            entered_at,
            until,
        }
    }
}

/// Result of a timeline reconstruction query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseAt {
    pub phase: DefensivePhase,
    pub entered_at: Timestamp,
}

/// Bounded ring of phase facts, newest last.
///
/// Capacity covers several full defensive sequences, which is more history
/// than any tolerated replication lag needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeline {
    facts: ArrayVec<PhaseFact, { CombatConfig::TIMELINE_CAPACITY }>,
}

impl Timeline {
    /// A timeline that has been idle since match start.
    pub fn new() -> Self {
        let mut facts = ArrayVec::new();
        facts.push(PhaseFact::new(DefensivePhase::Idle, Timestamp::ZERO, None));
        Self { facts }
    }

    /// Appends a fact, evicting the oldest when full.
    pub fn record(&mut self, fact: PhaseFact) {
        if self.facts.is_full() {
            self.facts.remove(0);
        }
        self.facts.push(fact);
    }

    /// The most recently entered phase.
    pub fn latest(&self) -> &PhaseFact {
        self.facts.last().expect("timeline is never empty")
    }

    pub fn facts(&self) -> &[PhaseFact] {
        &self.facts
    }

    /// Reconstructs the phase the combatant was logically in at `t`.
    ///
    /// A fact's interval runs from its `entered_at` (inclusive) to the next
    /// fact's `entered_at`, or to its own scheduled `until` when it is the
    /// newest fact (exclusive). Timestamps outside every interval — before
    /// retained history or past the newest bounded fact with no recorded
    /// successor — reconstruct as `Idle`, the conservative answer for hit
    /// arbitration.
    pub fn phase_at(&self, t: Timestamp) -> PhaseAt {
        for (i, fact) in self.facts.iter().enumerate().rev() {
            if t < fact.entered_at {
                continue;
            }
            let end = match self.facts.get(i + 1) {
                Some(next) => Some(next.entered_at),
                None => fact.until,
            };
            if end.is_none_or(|end| t < end) {
                return PhaseAt {
                    phase: fact.phase,
                    entered_at: fact.entered_at,
                };
            }
            // Newest fact overrun: the phase ended by schedule and no
            // successor has been observed yet.
            return PhaseAt {
                phase: DefensivePhase::Idle,
                entered_at: end.expect("overrun requires a bounded fact"),
            };
        }
        PhaseAt {
            phase: DefensivePhase::Idle,
            entered_at: Timestamp::ZERO,
        }
    }

    /// The parry-window start covering `t`, if the combatant was parrying.
    pub fn parry_start(&self, t: Timestamp) -> Option<Timestamp> {
        let at = self.phase_at(t);
        (at.phase == DefensivePhase::Parry).then_some(at.entered_at)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Timeline for a block activation at t=0 with default timings:
    /// Startup [0, 0.03), Parry [0.03, 0.3275), FailedParryGap [0.3275, 0.5),
    /// Block [0.5, ...).
    fn activation_at_zero() -> Timeline {
        let mut tl = Timeline::new();
        tl.record(PhaseFact::new(
            DefensivePhase::Startup,
            Timestamp(0.0),
            Some(Timestamp(0.03)),
        ));
        tl.record(PhaseFact::new(
            DefensivePhase::Parry,
            Timestamp(0.03),
            Some(Timestamp(0.3275)),
        ));
        tl.record(PhaseFact::new(
            DefensivePhase::FailedParryGap,
            Timestamp(0.3275),
            Some(Timestamp(0.5)),
        ));
        tl.record(PhaseFact::new(DefensivePhase::Block, Timestamp(0.5), None));
        tl
    }

    #[test]
    fn reconstructs_each_interval() {
        let tl = activation_at_zero();

        assert_eq!(tl.phase_at(Timestamp(0.01)).phase, DefensivePhase::Startup);
        assert_eq!(tl.phase_at(Timestamp(0.10)).phase, DefensivePhase::Parry);
        assert_eq!(
            tl.phase_at(Timestamp(0.40)).phase,
            DefensivePhase::FailedParryGap
        );
        assert_eq!(tl.phase_at(Timestamp(3.0)).phase, DefensivePhase::Block);
    }

    #[test]
    fn entry_boundary_belongs_to_new_phase() {
        let tl = activation_at_zero();

        assert_eq!(tl.phase_at(Timestamp(0.03)).phase, DefensivePhase::Parry);
        assert_eq!(
            tl.phase_at(Timestamp(0.3275)).phase,
            DefensivePhase::FailedParryGap
        );
        assert_eq!(tl.phase_at(Timestamp(0.5)).phase, DefensivePhase::Block);
    }

    #[test]
    fn parry_start_only_inside_window() {
        let tl = activation_at_zero();

        assert_eq!(tl.parry_start(Timestamp(0.10)), Some(Timestamp(0.03)));
        assert_eq!(tl.parry_start(Timestamp(0.02)), None);
        assert_eq!(tl.parry_start(Timestamp(0.40)), None);
    }

    #[test]
    fn lagging_replica_overrun_reads_idle() {
        // Replica has only seen the parry fact; the gap fact is still in
        // flight. A query past the scheduled parry end must not claim parry.
        let mut tl = Timeline::new();
        tl.record(PhaseFact::new(
            DefensivePhase::Startup,
            Timestamp(0.0),
            Some(Timestamp(0.03)),
        ));
        tl.record(PhaseFact::new(
            DefensivePhase::Parry,
            Timestamp(0.03),
            Some(Timestamp(0.3275)),
        ));

        assert_eq!(tl.phase_at(Timestamp(0.4)).phase, DefensivePhase::Idle);
    }

    #[test]
    fn eviction_keeps_newest_facts() {
        let mut tl = Timeline::new();
        for i in 0..CombatConfig::TIMELINE_CAPACITY + 4 {
            let t = i as f64;
            tl.record(PhaseFact::new(
                DefensivePhase::Cooldown,
                Timestamp(t),
                Some(Timestamp(t + 1.0)),
            ));
        }
        assert_eq!(tl.facts().len(), CombatConfig::TIMELINE_CAPACITY);
        assert_eq!(tl.latest().entered_at, Timestamp(19.0));
    }
}
