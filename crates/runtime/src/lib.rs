//! Authoritative combat runtime.
//!
//! Hosts the [`combat_core`] engine behind a single-writer worker task:
//! commands flow in over channels, replication facts and verdicts flow out on
//! a topic-based event bus, and the attacker-side [`prediction::Predictor`]
//! consumes the replicated stream to produce instant provisional verdicts
//! that reconcile against authority.

pub mod errors;
pub mod events;
pub mod handle;
pub mod prediction;
pub mod replication;
pub mod runtime;
pub mod worker;

pub use errors::{Result, RuntimeError};
pub use events::{CombatEvent, CombatTagUpdate, Event, EventBus, ReplicationEvent, Topic};
pub use handle::RuntimeHandle;
pub use prediction::{Predictor, Reconciliation};
pub use replication::{ReplicaStore, ReplicaView};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
