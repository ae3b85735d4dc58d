//! Defensive state machine transitions.
//!
//! Phase order: `Idle → Startup → Parry → FailedParryGap → Block → Cooldown →
//! Idle`, with two overrides: shakyblock suppresses the parry window, and
//! guardbreak suspends the machine entirely. Every transition appends a
//! timeline fact stamped with its scheduled deadline and arms the next
//! deadline; nothing here reads a clock.

use crate::error::ActivationError;
use crate::schedule::{Deadline, TransitionKind};
use crate::signal::Signal;
use crate::state::{
    CombatState, DefensivePhase, EntityId, PhaseFact, StatusKind, Timestamp,
};

/// Appends a timeline fact and emits its replication signal.
fn record_phase(
    state: &mut CombatState,
    entity: EntityId,
    fact: PhaseFact,
    out: &mut Vec<Signal>,
) {
    if let Some(combatant) = state.combatants.get_mut(entity) {
        combatant.timeline.record(fact);
        out.push(Signal::Phase { entity, fact });
    }
}

fn apply_status(
    state: &mut CombatState,
    entity: EntityId,
    kind: StatusKind,
    started_at: Timestamp,
    until: Option<Timestamp>,
    out: &mut Vec<Signal>,
) {
    if let Some(combatant) = state.combatants.get_mut(entity) {
        combatant.statuses.add(kind, started_at, until);
        out.push(Signal::StatusApplied {
            entity,
            kind,
            started_at,
            until,
        });
    }
}

fn end_status(state: &mut CombatState, entity: EntityId, kind: StatusKind, out: &mut Vec<Signal>) {
    if let Some(combatant) = state.combatants.get_mut(entity)
        && combatant.statuses.contains(kind)
    {
        combatant.statuses.remove(kind);
        out.push(Signal::StatusEnded { entity, kind });
    }
}

/// Starts a defensive activation: enter `Startup` and arm the parry deadline.
///
/// Rejected while guardbroken or knocked down, and while a previous sequence
/// (including its cooldown) is still running.
pub(crate) fn activate(
    state: &mut CombatState,
    entity: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) -> Result<(), ActivationError> {
    let config = state.config.clone();
    let combatant = state
        .combatants
        .get_mut(entity)
        .ok_or(ActivationError::UnknownEntity { entity })?;

    if combatant.is_guardbroken(now) {
        return Err(ActivationError::Guardbroken { entity });
    }
    if combatant.knocked_down {
        return Err(ActivationError::KnockedDown { entity });
    }
    match combatant.phase() {
        DefensivePhase::Idle => {}
        DefensivePhase::Cooldown => return Err(ActivationError::CoolingDown { entity }),
        _ => return Err(ActivationError::AlreadyEngaged { entity }),
    }

    combatant.block_held = true;

    let startup_end = now + config.block_startup_time;
    record_phase(
        state,
        entity,
        PhaseFact::new(DefensivePhase::Startup, now, Some(startup_end)),
        out,
    );
    state
        .scheduler
        .schedule(entity, TransitionKind::EnterParry, startup_end);
    Ok(())
}

/// Releases the defensive hold.
///
/// In `Block` this starts the cooldown immediately. During the earlier phases
/// the activation is committed: they run to completion and the machine drops
/// straight to `Cooldown` when the block-entry deadline fires. Idle and
/// cooling-down combatants are unaffected.
pub(crate) fn release(
    state: &mut CombatState,
    entity: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    let cooldown = state.config.block_cooldown;
    let Some(combatant) = state.combatants.get_mut(entity) else {
        return;
    };

    combatant.block_held = false;
    if combatant.phase() != DefensivePhase::Block {
        return;
    }

    end_status(state, entity, StatusKind::Blocking, out);
    let cooldown_end = now + cooldown;
    record_phase(
        state,
        entity,
        PhaseFact::new(DefensivePhase::Cooldown, now, Some(cooldown_end)),
        out,
    );
    state
        .scheduler
        .schedule(entity, TransitionKind::FinishCooldown, cooldown_end);
}

/// Applies a due machine transition. Deadlines for entities that left the
/// match have already been cancelled; a lookup miss here is silently dropped.
pub(crate) fn apply_transition(state: &mut CombatState, deadline: Deadline, out: &mut Vec<Signal>) {
    let Deadline { entity, kind, at } = deadline;
    if !state.combatants.contains(entity) {
        return;
    }
    let config = state.config.clone();

    match kind {
        TransitionKind::EnterParry => {
            let shaky = state
                .combatants
                .get(entity)
                .is_some_and(|c| c.shakyblock_active(at));
            if shaky {
                // No parry-eligible interval exists: the whole would-be parry
                // window plus the usual gap is vulnerable, and block still
                // settles in on the original schedule.
                let gap_end =
                    at + config.parry_window_duration + config.failed_parry_window_duration;
                record_phase(
                    state,
                    entity,
                    PhaseFact::new(DefensivePhase::FailedParryGap, at, Some(gap_end)),
                    out,
                );
                state
                    .scheduler
                    .schedule(entity, TransitionKind::EnterBlock, gap_end);
            } else {
                let parry_end = at + config.parry_window_duration;
                record_phase(
                    state,
                    entity,
                    PhaseFact::new(DefensivePhase::Parry, at, Some(parry_end)),
                    out,
                );
                apply_status(state, entity, StatusKind::Parrying, at, Some(parry_end), out);
                state
                    .scheduler
                    .schedule(entity, TransitionKind::EnterParryGap, parry_end);
            }
        }

        TransitionKind::EnterParryGap => {
            end_status(state, entity, StatusKind::Parrying, out);
            let gap_end = at + config.failed_parry_window_duration;
            record_phase(
                state,
                entity,
                PhaseFact::new(DefensivePhase::FailedParryGap, at, Some(gap_end)),
                out,
            );
            state
                .scheduler
                .schedule(entity, TransitionKind::EnterBlock, gap_end);
        }

        TransitionKind::EnterBlock => {
            let held = state
                .combatants
                .get(entity)
                .is_some_and(|c| c.block_held);
            if held {
                record_phase(
                    state,
                    entity,
                    PhaseFact::new(DefensivePhase::Block, at, None),
                    out,
                );
                apply_status(state, entity, StatusKind::Blocking, at, None, out);
            } else {
                let cooldown_end = at + config.block_cooldown;
                record_phase(
                    state,
                    entity,
                    PhaseFact::new(DefensivePhase::Cooldown, at, Some(cooldown_end)),
                    out,
                );
                state
                    .scheduler
                    .schedule(entity, TransitionKind::FinishCooldown, cooldown_end);
            }
        }

        TransitionKind::FinishCooldown => {
            record_phase(
                state,
                entity,
                PhaseFact::new(DefensivePhase::Idle, at, None),
                out,
            );
        }

        TransitionKind::GuardbreakExpiry => {
            end_status(state, entity, StatusKind::Guardbroken, out);
        }

        // Owned by the knockdown controller.
        TransitionKind::KnockdownRecovery => {}
    }
}

/// Cancels the machine's pending transitions and forces it back to `Idle`.
/// Shared by the guardbreak and knockdown overrides.
pub(crate) fn suspend_machine(
    state: &mut CombatState,
    entity: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    for kind in TransitionKind::MACHINE {
        state.scheduler.cancel(entity, kind);
    }

    let Some(combatant) = state.combatants.get_mut(entity) else {
        return;
    };
    combatant.block_held = false;

    let was_parrying = combatant.statuses.has(StatusKind::Parrying, now);
    let was_blocking = combatant.statuses.has(StatusKind::Blocking, now);
    if was_parrying {
        end_status(state, entity, StatusKind::Parrying, out);
    }
    if was_blocking {
        end_status(state, entity, StatusKind::Blocking, out);
    }

    let idle_already = state
        .combatants
        .get(entity)
        .is_some_and(|c| c.phase() == DefensivePhase::Idle);
    if !idle_already {
        record_phase(
            state,
            entity,
            PhaseFact::new(DefensivePhase::Idle, now, None),
            out,
        );
    }
}

/// Enters the guardbroken override: machine suspended, posture reset, and a
/// recovery deadline armed. Only ever reached through the uncapped posture
/// path saturating.
pub(crate) fn trigger_guardbreak(
    state: &mut CombatState,
    entity: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    let config = state.config.clone();
    suspend_machine(state, entity, now, out);

    let until = now + config.guardbreak_duration;
    apply_status(state, entity, StatusKind::Guardbroken, now, Some(until), out);
    out.push(Signal::Guardbroken { entity, until });

    // The meter restarts empty, otherwise the first post-recovery chip would
    // immediately re-saturate it.
    if let Some(combatant) = state.combatants.get_mut(entity) {
        combatant.posture.current = 0.0;
        combatant.posture.last_action_at = now;
        out.push(Signal::Posture {
            entity,
            current: 0.0,
            max: combatant.posture.max,
        });
    }

    state
        .scheduler
        .schedule(entity, TransitionKind::GuardbreakExpiry, until);
}
