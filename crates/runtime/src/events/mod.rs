//! Event bus and event payloads published by the authority worker.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CombatEvent, CombatTagUpdate, ReplicationEvent};

use combat_core::signal::Signal;

/// Maps an engine signal onto the bus event it is published as.
pub(crate) fn event_for(signal: Signal) -> Event {
    match signal {
        Signal::Phase { entity, fact } => Event::Replication(ReplicationEvent::Phase { entity, fact }),
        Signal::Posture {
            entity,
            current,
            max,
        } => Event::Replication(ReplicationEvent::Posture {
            entity,
            current,
            max,
        }),
        Signal::StatusApplied {
            entity,
            kind,
            started_at,
            until,
        } => Event::Replication(ReplicationEvent::StatusApplied {
            entity,
            kind,
            started_at,
            until,
        }),
        Signal::StatusEnded { entity, kind } => {
            Event::Replication(ReplicationEvent::StatusEnded { entity, kind })
        }
        Signal::Immunity { entity, until } => {
            Event::Replication(ReplicationEvent::Immunity { entity, until })
        }
        Signal::TagRemaining { entity, remaining } => {
            Event::Tag(CombatTagUpdate { entity, remaining })
        }
        Signal::Verdict(verdict) => Event::Combat(CombatEvent::VerdictReached { verdict }),
        Signal::Guardbroken { entity, until } => {
            Event::Combat(CombatEvent::Guardbroken { entity, until })
        }
        Signal::KnockdownStarted { entity, recover_at } => {
            Event::Combat(CombatEvent::KnockdownStarted { entity, recover_at })
        }
        Signal::KnockdownRecovered {
            entity,
            immune_until,
        } => Event::Combat(CombatEvent::KnockdownRecovered {
            entity,
            immune_until,
        }),
        Signal::ClampHealthToFloor { entity } => {
            Event::Combat(CombatEvent::HealthClampRequired { entity })
        }
        Signal::KillCredit { victim, attacker } => {
            Event::Combat(CombatEvent::KillCredit { victim, attacker })
        }
        Signal::SuspiciousClaim {
            swing_id, attacker, ..
        } => Event::Combat(CombatEvent::SuspiciousClaim { swing_id, attacker }),
    }
}
