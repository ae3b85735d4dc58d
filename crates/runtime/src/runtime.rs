//! High-level runtime orchestrator.
//!
//! The runtime owns the authority worker, wires up command/event channels,
//! and exposes a builder-based API for hosts to drive the simulation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::sync::mpsc;

use combat_core::config::CombatConfig;
use combat_core::env::{FacingOracle, FixedFacing};
use combat_core::state::CombatState;

use crate::errors::{Result, RuntimeError};
use crate::events::EventBus;
use crate::handle::RuntimeHandle;
use crate::worker::{AuthorityWorker, Command};

/// Runtime configuration shared across the orchestrator and worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    /// Deadline-poll cadence.
    pub tick_interval: Duration,
    /// Tag-expiry and ledger-pruning cadence.
    pub sweep_interval: Duration,
    pub command_buffer_size: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            tick_interval: Duration::from_millis(16),
            sweep_interval: Duration::from_secs(1),
            command_buffer_size: 32,
            event_capacity: 128,
        }
    }
}

/// Main runtime that orchestrates the authoritative combat simulation.
///
/// Design: the runtime owns the worker; [`RuntimeHandle`] provides a
/// cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully: drop the owned handle and wait for
    /// the worker to drain. Outstanding handle clones keep the worker alive
    /// until they are dropped too.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    facing: Option<Arc<dyn FacingOracle + Send + Sync>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            facing: None,
        }
    }

    /// Override runtime configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override combat tuning only.
    pub fn combat_config(mut self, combat: CombatConfig) -> Self {
        self.config.combat = combat;
        self
    }

    /// Set the facing geometry collaborator.
    ///
    /// Defaults to [`FixedFacing`]`(true)` for matches without geometry.
    pub fn facing(mut self, oracle: impl FacingOracle + Send + Sync + 'static) -> Self {
        self.facing = Some(Arc::new(oracle));
        self
    }

    /// Build the runtime and spawn its authority worker.
    pub fn build(self) -> Runtime {
        let facing = self
            .facing
            .unwrap_or_else(|| Arc::new(FixedFacing(true)));

        let (command_tx, command_rx) =
            mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_capacity);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let state = CombatState::new(self.config.combat.clone());
        let worker = AuthorityWorker::new(
            state,
            facing,
            command_rx,
            event_bus,
            self.config.tick_interval,
            self.config.sweep_interval,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Runtime {
            handle,
            worker_handle,
        }
    }
}
