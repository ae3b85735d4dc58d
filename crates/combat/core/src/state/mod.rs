//! Authoritative combat state representation.
//!
//! This module owns the data structures describing combatants, their phase
//! timelines, statuses, and lifecycle. The runtime layer clones or queries
//! this state but mutates it exclusively through the engine.

pub mod combatant;
pub mod common;
pub mod status;
pub mod timeline;

use std::collections::HashMap;

pub use combatant::CombatantState;
pub use common::{EntityId, Seconds, SwingId, Timestamp};
pub use status::{StatusEffect, StatusEffects, StatusKind};
pub use timeline::{DefensivePhase, PhaseAt, PhaseFact, Timeline};

use crate::config::CombatConfig;
use crate::resolve::SwingLedger;
use crate::schedule::Scheduler;

/// Id-keyed store of combatants with explicit create-on-join /
/// destroy-on-leave lifecycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombatantsState {
    combatants: HashMap<EntityId, CombatantState>,
}

impl CombatantsState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inserts a fresh combatant. Returns false if the id is already present.
    pub fn insert(&mut self, combatant: CombatantState) -> bool {
        use std::collections::hash_map::Entry;
        match self.combatants.entry(combatant.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(combatant);
                true
            }
        }
    }

    /// Removes and returns a combatant. Pending scheduler deadlines must be
    /// cancelled by the caller in the same step.
    pub fn remove(&mut self, id: EntityId) -> Option<CombatantState> {
        self.combatants.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&CombatantState> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CombatantState> {
        self.combatants.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.combatants.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatantState> {
        self.combatants.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatantState> {
        self.combatants.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.combatants.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}

/// Canonical authoritative combat state: the combatant store plus the
/// pending-transition schedule and the resolved-swing ledger.
///
/// One instance exists per match, owned and serially mutated by the
/// authoritative process. All mutation flows through
/// [`crate::engine::CombatEngine`].
#[derive(Debug, Default)]
pub struct CombatState {
    pub config: CombatConfig,
    pub combatants: CombatantsState,
    pub scheduler: Scheduler,
    pub resolved: SwingLedger,
}

impl CombatState {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            combatants: CombatantsState::empty(),
            scheduler: Scheduler::new(),
            resolved: SwingLedger::new(),
        }
    }
}
