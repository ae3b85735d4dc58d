//! Engine facade over authoritative combat state.
//!
//! The [`CombatEngine`] is the single writer for [`CombatState`]: combatant
//! lifecycle, defensive activations, hit resolution, zero-health reports, and
//! the per-tick advance all flow through it. Every operation returns the
//! signals it produced; the hosting runtime publishes them.

use crate::defense;
use crate::env::FacingOracle;
use crate::error::{ActivationError, EngineError};
use crate::knockdown::{self, ZeroHealthOutcome};
use crate::resolve::{self, HitEvent, Verdict};
use crate::schedule::TransitionKind;
use crate::signal::Signal;
use crate::state::{CombatState, CombatantState, DefensivePhase, EntityId, Seconds, Timestamp};
use crate::tag;

pub struct CombatEngine<'a> {
    state: &'a mut CombatState,
}

impl<'a> CombatEngine<'a> {
    pub fn new(state: &'a mut CombatState) -> Self {
        Self { state }
    }

    /// Creates a combatant's state when an entity joins the simulation.
    pub fn join(&mut self, entity: EntityId) -> Result<(), EngineError> {
        let combatant = CombatantState::new(entity, self.state.config.posture_max);
        if self.state.combatants.insert(combatant) {
            Ok(())
        } else {
            Err(EngineError::AlreadyJoined { entity })
        }
    }

    /// Destroys a combatant's state when the entity leaves.
    ///
    /// Pending deadlines are cancelled in the same serial step, and leaving
    /// while combat-tagged awards the kill to the last attacker.
    pub fn leave(&mut self, entity: EntityId, now: Timestamp) -> Result<Vec<Signal>, EngineError> {
        let combatant = self
            .state
            .combatants
            .remove(entity)
            .ok_or(EngineError::UnknownEntity { entity })?;

        let mut out = Vec::new();
        tag::on_leave(&combatant, now, &mut out);
        self.state.scheduler.cancel_entity(entity);
        Ok(out)
    }

    /// Starts a defensive activation.
    pub fn activate_block(
        &mut self,
        entity: EntityId,
        now: Timestamp,
    ) -> Result<Vec<Signal>, ActivationError> {
        let mut out = Vec::new();
        defense::activate(self.state, entity, now, &mut out)?;
        Ok(out)
    }

    /// Releases the defensive hold.
    pub fn release_block(
        &mut self,
        entity: EntityId,
        now: Timestamp,
    ) -> Result<Vec<Signal>, EngineError> {
        if !self.state.combatants.contains(entity) {
            return Err(EngineError::UnknownEntity { entity });
        }
        let mut out = Vec::new();
        defense::release(self.state, entity, now, &mut out);
        Ok(out)
    }

    /// Authoritatively resolves a submitted hit event and applies its side
    /// effects exactly once.
    pub fn resolve_hit(
        &mut self,
        event: &HitEvent,
        facing: &dyn FacingOracle,
        now: Timestamp,
    ) -> (Verdict, Vec<Signal>) {
        let facing = facing.is_facing(event.target, event.attacker);
        let mut out = Vec::new();
        let verdict = resolve::resolve(self.state, event, facing, now, &mut out);
        (verdict, out)
    }

    /// Handles a zero-health report from the health collaborator.
    pub fn report_zero_health(
        &mut self,
        entity: EntityId,
        prior_health_fraction: f32,
        now: Timestamp,
    ) -> Result<(ZeroHealthOutcome, Vec<Signal>), EngineError> {
        let mut out = Vec::new();
        let outcome =
            knockdown::report_zero_health(self.state, entity, prior_health_fraction, now, &mut out)
                .ok_or(EngineError::UnknownEntity { entity })?;
        Ok((outcome, out))
    }

    /// Tags both participants of an externally reported damage event.
    pub fn tag_combatants(
        &mut self,
        attacker: EntityId,
        victim: EntityId,
        now: Timestamp,
    ) -> Vec<Signal> {
        let mut out = Vec::new();
        tag::tag_pair(self.state, attacker, victim, now, &mut out);
        out
    }

    /// Per-tick advance: fires due scheduled transitions in deadline order,
    /// runs posture recovery, and expires statuses. `dt` is the time covered
    /// since the previous advance.
    pub fn advance(&mut self, now: Timestamp, dt: Seconds) -> Vec<Signal> {
        let mut out = Vec::new();

        while let Some(deadline) = self.state.scheduler.pop_due(now) {
            match deadline.kind {
                TransitionKind::KnockdownRecovery => {
                    knockdown::recover(self.state, deadline.entity, deadline.at, &mut out);
                }
                _ => defense::apply_transition(self.state, deadline, &mut out),
            }
        }

        let config = self.state.config.clone();
        for combatant in self.state.combatants.iter_mut() {
            let blocking = combatant.phase() == DefensivePhase::Block;
            if combatant.posture.recover(now, dt, blocking, &config) {
                out.push(Signal::Posture {
                    entity: combatant.id,
                    current: combatant.posture.current,
                    max: combatant.posture.max,
                });
            }
        }

        for combatant in self.state.combatants.iter_mut() {
            let entity = combatant.id;
            for kind in combatant.statuses.remove_expired(now) {
                out.push(Signal::StatusEnded { entity, kind });
            }
        }

        out
    }

    /// Coarse periodic sweep: combat-tag expiry and UI updates, plus
    /// resolved-swing ledger pruning.
    pub fn sweep(&mut self, now: Timestamp) -> Vec<Signal> {
        let mut out = Vec::new();
        tag::sweep(self.state, now, &mut out);
        self.state.resolved.prune(now);
        out
    }
}
