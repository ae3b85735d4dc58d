//! Traits describing external collaborator facts.
//!
//! The engine consumes geometry through a narrow oracle seam so resolution
//! stays free of any spatial representation.

use crate::state::EntityId;

/// Read-only facing geometry, delegated to an external collaborator.
///
/// Blocking only negates damage while the defender faces the attacker; this
/// core does not know about positions or view cones.
pub trait FacingOracle {
    /// Whether `defender` is currently facing `attacker`.
    fn is_facing(&self, defender: EntityId, attacker: EntityId) -> bool;
}

/// Fixed facing answer, for matches without geometry and for tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedFacing(pub bool);

impl FacingOracle for FixedFacing {
    fn is_facing(&self, _defender: EntityId, _attacker: EntityId) -> bool {
        self.0
    }
}
