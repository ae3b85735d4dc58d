//! Hit-resolution arbiter.
//!
//! One evaluation routine serves both sides of the link: a predicting peer
//! runs it against replicated facts for an instant provisional outcome, and
//! the authority re-runs it against ground truth. The peer's declaration is
//! only ever a hint for the parry tolerance check — the final outcome always
//! derives from the authoritative timeline.

use crate::config::CombatConfig;
use crate::defense;
use crate::resolve::{Effect, HitEvent, Outcome, Verdict};
use crate::signal::Signal;
use crate::state::{
    CombatState, DefensivePhase, StatusEffects, StatusKind, Timeline, Timestamp,
};
use crate::tag;

/// Read-only view of one defender's facts, from either side of the link.
#[derive(Clone, Copy, Debug)]
pub struct DefenseView<'a> {
    pub timeline: &'a Timeline,
    pub statuses: &'a StatusEffects,
}

/// Outcome of evaluating a defender's facts at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub outcome: Outcome,
    /// Start of the parry window that covered the attack, when the outcome
    /// is a window parry. Autoparry-based parries carry no window start.
    pub parry_start: Option<Timestamp>,
    /// Phase the defender was logically in at the attack instant.
    pub phase: DefensivePhase,
}

/// Derives the defensive outcome for an attack at `t`.
///
/// Parry phase parries; an active autoparry status counts as parrying (a
/// successful parry's follow-up window is not a vulnerable gap); block only
/// holds while facing the attacker. Everything else is a clean hit.
pub fn evaluate(view: DefenseView<'_>, t: Timestamp, facing: bool) -> Evaluation {
    let at = view.timeline.phase_at(t);

    if at.phase == DefensivePhase::Parry {
        return Evaluation {
            outcome: Outcome::Parried,
            parry_start: Some(at.entered_at),
            phase: at.phase,
        };
    }
    if view.statuses.has(StatusKind::Autoparry, t) {
        return Evaluation {
            outcome: Outcome::Parried,
            parry_start: None,
            phase: at.phase,
        };
    }
    if at.phase == DefensivePhase::Block && facing {
        return Evaluation {
            outcome: Outcome::Blocked,
            parry_start: None,
            phase: at.phase,
        };
    }
    Evaluation {
        outcome: Outcome::Hit,
        parry_start: None,
        phase: at.phase,
    }
}

/// Side effects mandated by an outcome, per the punishment table.
fn build_effects(event: &HitEvent, evaluation: &Evaluation, config: &CombatConfig) -> Vec<Effect> {
    let mut effects = Vec::new();
    match evaluation.outcome {
        Outcome::Parried => {
            effects.push(Effect::Status {
                target: event.attacker,
                kind: StatusKind::SoftHitstun,
                duration: config.soft_hitstun_duration,
            });
            effects.push(Effect::PostureDamage {
                target: event.attacker,
                amount: config.parried_posture_damage,
                capped: true,
            });
            effects.push(Effect::Status {
                target: event.target,
                kind: StatusKind::Autoparry,
                duration: config.autoparry_duration,
            });
            effects.push(Effect::PostureReward {
                target: event.target,
                amount: config.parry_posture_reward,
            });
        }
        Outcome::Blocked => {
            effects.push(Effect::Status {
                target: event.target,
                kind: StatusKind::BlockStunned,
                duration: config.block_stun_duration,
            });
            effects.push(Effect::PostureDamage {
                target: event.target,
                amount: config.block_posture_damage,
                capped: false,
            });
        }
        Outcome::Hit => {
            effects.push(Effect::Damage {
                target: event.target,
            });
            effects.push(Effect::Status {
                target: event.target,
                kind: StatusKind::SoftHitstun,
                duration: config.soft_hitstun_duration,
            });
            // Landing inside a mistimed activation is punished with a
            // suppressed parry window; a hit through an unfaced block is not.
            if matches!(
                evaluation.phase,
                DefensivePhase::Startup | DefensivePhase::FailedParryGap
            ) {
                effects.push(Effect::Status {
                    target: event.target,
                    kind: StatusKind::Shakyblock,
                    duration: config.shakyblock_duration,
                });
            }
        }
        Outcome::Miss => {}
    }
    effects
}

/// Authoritatively resolves a submitted hit event.
///
/// Idempotent per swing id: re-delivery returns the cached verdict and
/// applies nothing. A missing attacker or target (disconnect race) resolves
/// to a no-effect miss.
pub(crate) fn resolve(
    state: &mut CombatState,
    event: &HitEvent,
    facing: bool,
    now: Timestamp,
    out: &mut Vec<Signal>,
) -> Verdict {
    if let Some(cached) = state.resolved.get(event.swing_id) {
        return cached.clone();
    }

    if !state.combatants.contains(event.attacker) || !state.combatants.contains(event.target) {
        let verdict = Verdict::authoritative(event.swing_id, Outcome::Miss, Vec::new());
        state.resolved.record(verdict.clone(), now);
        out.push(Signal::Verdict(verdict.clone()));
        return verdict;
    }

    let target = state
        .combatants
        .get(event.target)
        .expect("presence checked above");
    let evaluation = evaluate(
        DefenseView {
            timeline: &target.timeline,
            statuses: &target.statuses,
        },
        event.attack_timestamp,
        facing,
    );

    // The declaration is a hint, never ground truth: a parry claim is
    // confirmed only when the authoritative window agrees within tolerance.
    // Anything else keeps the independently derived outcome and is flagged
    // for the observability collaborator.
    if event.declared_outcome == Outcome::Parried {
        let confirmed = evaluation.outcome == Outcome::Parried
            && match (evaluation.parry_start, event.declared_parry_start) {
                (Some(auth), Some(declared)) => {
                    auth.since(declared).abs() <= state.config.latency_tolerance
                }
                // Autoparry-based parries have no window to cross-check.
                (None, _) => true,
                (Some(_), None) => false,
            };
        if !confirmed {
            out.push(Signal::SuspiciousClaim {
                swing_id: event.swing_id,
                attacker: event.attacker,
                declared_parry_start: event.declared_parry_start,
                authoritative_parry_start: evaluation.parry_start,
            });
        }
    }

    let effects = build_effects(event, &evaluation, &state.config);
    apply_verdict_effects(state, event, &effects, now, out);

    let verdict = Verdict::authoritative(event.swing_id, evaluation.outcome, effects);
    state.resolved.record(verdict.clone(), now);
    out.push(Signal::Verdict(verdict.clone()));
    verdict
}

/// Applies effects and the symmetric combat tag for damage events.
fn apply_verdict_effects(
    state: &mut CombatState,
    event: &HitEvent,
    effects: &[Effect],
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    let mut dealt_damage = false;

    for effect in effects {
        match *effect {
            Effect::Damage { .. } => {
                dealt_damage = true;
            }
            Effect::Status {
                target,
                kind,
                duration,
            } => {
                if let Some(combatant) = state.combatants.get_mut(target) {
                    let until = now + duration;
                    combatant.statuses.add(kind, now, Some(until));
                    out.push(Signal::StatusApplied {
                        entity: target,
                        kind,
                        started_at: now,
                        until: Some(until),
                    });
                }
            }
            Effect::PostureDamage {
                target,
                amount,
                capped,
            } => {
                let soft_cap = state.config.posture_soft_cap();
                let mut saturated = false;
                if let Some(combatant) = state.combatants.get_mut(target) {
                    if capped {
                        combatant.posture.add_capped(amount, soft_cap, now);
                    } else {
                        saturated = combatant.posture.add(amount, now)
                            == crate::posture::PostureGain::Saturated;
                    }
                    out.push(Signal::Posture {
                        entity: target,
                        current: combatant.posture.current,
                        max: combatant.posture.max,
                    });
                }
                if saturated {
                    defense::trigger_guardbreak(state, target, now, out);
                }
            }
            Effect::PostureReward { target, amount } => {
                if let Some(combatant) = state.combatants.get_mut(target) {
                    combatant.posture.remove(amount, now);
                    out.push(Signal::Posture {
                        entity: target,
                        current: combatant.posture.current,
                        max: combatant.posture.max,
                    });
                }
            }
        }
    }

    if dealt_damage {
        tag::tag_pair(state, event.attacker, event.target, now, out);
    }
}
