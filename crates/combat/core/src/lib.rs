//! Deterministic defensive-combat rules shared across the authority and
//! predicting peers.
//!
//! `combat-core` defines the canonical timing and validation logic: the
//! defensive state machine and its replicable phase timeline, posture
//! accumulation and guardbreak, knockdown with post-recovery immunity, combat
//! tagging, the deadline scheduler, and the hit-resolution arbiter. All state
//! mutation flows through [`engine::CombatEngine`]; the crate performs no
//! I/O and reads no clocks, so the runtime and offline tools replay it
//! identically.

pub mod config;
mod defense;
pub mod engine;
pub mod env;
pub mod error;
mod knockdown;
pub mod posture;
pub mod resolve;
pub mod schedule;
pub mod signal;
pub mod state;
mod tag;

pub use config::CombatConfig;
pub use engine::CombatEngine;
pub use env::{FacingOracle, FixedFacing};
pub use error::{ActivationError, EngineError};
pub use knockdown::ZeroHealthOutcome;
pub use posture::{PostureGain, PostureMeter};
pub use resolve::{DefenseView, Effect, Evaluation, HitEvent, Outcome, SwingLedger, Verdict, evaluate};
pub use schedule::{Deadline, Scheduler, TransitionKind};
pub use signal::Signal;
pub use state::{
    CombatState, CombatantState, CombatantsState, DefensivePhase, EntityId, PhaseAt, PhaseFact,
    Seconds, StatusEffect, StatusEffects, StatusKind, SwingId, Timeline, Timestamp,
};
