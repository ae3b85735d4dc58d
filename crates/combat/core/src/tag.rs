//! Combat tagging and kill-credit-on-disconnect.

use crate::signal::Signal;
use crate::state::{CombatState, CombatantState, EntityId, Timestamp};

/// Marks both participants of a damage event as in combat.
///
/// Refresh is monotonic: re-tagging never shortens a longer tag that is
/// already running.
pub(crate) fn tag_pair(
    state: &mut CombatState,
    attacker: EntityId,
    victim: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    tag_one(state, victim, attacker, now, out);
    tag_one(state, attacker, victim, now, out);
}

fn tag_one(
    state: &mut CombatState,
    entity: EntityId,
    opponent: EntityId,
    now: Timestamp,
    out: &mut Vec<Signal>,
) {
    let duration = state.config.combat_tag_duration;
    let Some(combatant) = state.combatants.get_mut(entity) else {
        return;
    };

    let refreshed = now + duration;
    let until = match combatant.combat_tag_until {
        Some(current) => current.max(refreshed),
        None => refreshed,
    };
    combatant.combat_tag_until = Some(until);
    combatant.last_attacker = Some(opponent);

    out.push(Signal::TagRemaining {
        entity,
        remaining: until.since(now),
    });
}

/// Resolves a combat tag when its owner leaves the match. Leaving while
/// tagged counts as death: the last attacker is awarded the kill.
pub(crate) fn on_leave(combatant: &CombatantState, now: Timestamp, out: &mut Vec<Signal>) {
    if combatant.combat_tagged(now)
        && let Some(attacker) = combatant.last_attacker
    {
        out.push(Signal::KillCredit {
            victim: combatant.id,
            attacker,
        });
    }
}

/// Periodic sweep: clears expired tags and pushes remaining time for live
/// ones to the UI collaborator.
pub(crate) fn sweep(state: &mut CombatState, now: Timestamp, out: &mut Vec<Signal>) {
    for combatant in state.combatants.iter_mut() {
        let Some(until) = combatant.combat_tag_until else {
            continue;
        };
        if now >= until {
            combatant.combat_tag_until = None;
            combatant.last_attacker = None;
            out.push(Signal::TagRemaining {
                entity: combatant.id,
                remaining: 0.0,
            });
        } else {
            out.push(Signal::TagRemaining {
                entity: combatant.id,
                remaining: until.since(now),
            });
        }
    }
}
