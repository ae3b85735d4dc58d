//! Knockdown and post-recovery immunity.
//!
//! A zero-health report substitutes a knockdown for death unless an immunity
//! window, the instant-kill threshold, or an execution in progress says
//! otherwise. The evaluation order is fixed and every existence/validity
//! check runs strictly before the first mutation, so both the trigger and
//! the recovery are all-or-nothing.

use crate::defense;
use crate::schedule::TransitionKind;
use crate::signal::Signal;
use crate::state::{CombatState, EntityId, StatusKind, Timestamp};

/// Decision taken for a zero-health report.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZeroHealthOutcome {
    /// Already knocked down; the report is ignored.
    AlreadyDown,
    /// An execution is in progress: real death is permitted, nothing here
    /// applies.
    LethalAllowed,
    /// Inside an immunity window: health is clamped to the floor, no new
    /// knockdown.
    ClampedByImmunity,
    /// Health hit zero from at or below the instant-kill threshold; the
    /// external death path takes over.
    InstantKill,
    /// Knockdown triggered; recovery fires at the given moment.
    KnockedDown { recover_at: Timestamp },
}

/// Handles a zero-health report from the health collaborator.
///
/// `prior_health_fraction` is the health fraction last observed before this
/// zero event.
pub(crate) fn report_zero_health(
    state: &mut CombatState,
    entity: EntityId,
    prior_health_fraction: f32,
    now: Timestamp,
    out: &mut Vec<Signal>,
) -> Option<ZeroHealthOutcome> {
    let config = state.config.clone();
    let combatant = state.combatants.get(entity)?;

    if combatant.knocked_down {
        return Some(ZeroHealthOutcome::AlreadyDown);
    }
    if combatant.executing {
        return Some(ZeroHealthOutcome::LethalAllowed);
    }
    let immune = combatant.knockdown_immune(now)
        || combatant
            .recovery_timestamp
            .is_some_and(|recovered| now.since(recovered) < config.post_recovery_immunity);
    if immune {
        out.push(Signal::ClampHealthToFloor { entity });
        return Some(ZeroHealthOutcome::ClampedByImmunity);
    }
    if prior_health_fraction <= config.instant_kill_hp_threshold {
        return Some(ZeroHealthOutcome::InstantKill);
    }

    // All checks passed; from here the trigger runs to completion.
    let recover_at = now + config.knockdown_duration;
    defense::suspend_machine(state, entity, now, out);

    let combatant = state
        .combatants
        .get_mut(entity)
        .expect("checked above; suspend_machine does not remove combatants");
    combatant.knocked_down = true;
    combatant.recovery_timestamp = None;
    combatant
        .statuses
        .add(StatusKind::Knockdown, now, Some(recover_at));

    out.push(Signal::StatusApplied {
        entity,
        kind: StatusKind::Knockdown,
        started_at: now,
        until: Some(recover_at),
    });
    out.push(Signal::ClampHealthToFloor { entity });
    out.push(Signal::KnockdownStarted { entity, recover_at });

    state
        .scheduler
        .schedule(entity, TransitionKind::KnockdownRecovery, recover_at);
    Some(ZeroHealthOutcome::KnockedDown { recover_at })
}

/// Completes a knockdown recovery. Fires exactly once per knockdown and runs
/// to completion even if the combatant's health is still at the floor: the
/// clamp signal is emitted before any state change so the health collaborator
/// can never observe a recovered-but-dead combatant.
pub(crate) fn recover(
    state: &mut CombatState,
    entity: EntityId,
    at: Timestamp,
    out: &mut Vec<Signal>,
) {
    let post_recovery_immunity = state.config.post_recovery_immunity;
    let Some(combatant) = state.combatants.get_mut(entity) else {
        return;
    };
    if !combatant.knocked_down {
        return;
    }

    out.push(Signal::ClampHealthToFloor { entity });

    let immune_until = at + post_recovery_immunity;
    combatant.knocked_down = false;
    combatant.recovery_timestamp = Some(at);
    combatant.immunity_until = Some(immune_until);
    combatant.statuses.remove(StatusKind::Knockdown);

    out.push(Signal::StatusEnded {
        entity,
        kind: StatusKind::Knockdown,
    });
    out.push(Signal::Immunity {
        entity,
        until: Some(immune_until),
    });
    out.push(Signal::KnockdownRecovered {
        entity,
        immune_until,
    });
}
