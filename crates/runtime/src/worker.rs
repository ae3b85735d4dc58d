//! Authority worker that owns the authoritative [`CombatState`].
//!
//! Single-writer discipline: this task is the only place ground truth is
//! mutated, serially, command by command. Commands arrive from
//! [`crate::RuntimeHandle`], deadlines are polled on a fixed tick, and every
//! engine signal is published to the event bus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use combat_core::engine::CombatEngine;
use combat_core::env::FacingOracle;
use combat_core::resolve::{HitEvent, Verdict};
use combat_core::signal::Signal;
use combat_core::state::{CombatState, CombatantsState, EntityId, Timestamp};
use combat_core::ZeroHealthOutcome;

use crate::errors::Result;
use crate::events::{EventBus, event_for};

/// Commands accepted by the authority worker.
pub enum Command {
    /// Create combat state for an entity joining the match.
    Join {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Destroy an entity's combat state; resolves kill credit if it was
    /// combat-tagged.
    Leave {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Begin a defensive activation.
    ActivateBlock {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Release the defensive hold.
    ReleaseBlock {
        entity: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Authoritatively resolve a peer-submitted swing.
    SubmitHit {
        event: HitEvent,
        reply: oneshot::Sender<Result<Verdict>>,
    },
    /// Zero-health report from the health collaborator.
    ReportZeroHealth {
        entity: EntityId,
        prior_health_fraction: f32,
        reply: oneshot::Sender<Result<ZeroHealthOutcome>>,
    },
    /// Read-only snapshot of all combatants.
    QuerySnapshot {
        reply: oneshot::Sender<CombatantsState>,
    },
    /// Current authoritative match time.
    QueryNow { reply: oneshot::Sender<Timestamp> },
}

/// Background task that serially mutates authoritative combat state.
pub struct AuthorityWorker {
    state: CombatState,
    facing: Arc<dyn FacingOracle + Send + Sync>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    epoch: Instant,
    last_advance: Timestamp,
    tick_interval: Duration,
    sweep_interval: Duration,
}

impl AuthorityWorker {
    pub fn new(
        state: CombatState,
        facing: Arc<dyn FacingOracle + Send + Sync>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        tick_interval: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            state,
            facing,
            command_rx,
            event_bus,
            epoch: Instant::now(),
            last_advance: Timestamp::ZERO,
            tick_interval,
            sweep_interval,
        }
    }

    /// Main worker loop. Exits when every handle has been dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweeper = tokio::time::interval(self.sweep_interval);
        sweeper.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_cmd = self.command_rx.recv() => match maybe_cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick() => self.advance(),
                _ = sweeper.tick() => self.sweep(),
            }
        }

        debug!(target: "runtime::authority", "command channel closed, worker stopping");
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.epoch.elapsed().as_secs_f64())
    }

    /// Fires due deadlines, runs posture recovery, expires statuses.
    fn advance(&mut self) {
        let now = self.now();
        let dt = now.since(self.last_advance);
        self.last_advance = now;

        let signals = CombatEngine::new(&mut self.state).advance(now, dt);
        self.publish(signals);
    }

    /// Coarse periodic housekeeping: tag expiry/updates, ledger pruning.
    fn sweep(&mut self) {
        let now = self.now();
        let signals = CombatEngine::new(&mut self.state).sweep(now);
        self.publish(signals);
    }

    fn handle_command(&mut self, cmd: Command) {
        // Commands observe fully caught-up state: fire anything already due
        // before mutating, so a submitted hit never races a pending phase
        // transition.
        self.advance();
        let now = self.now();

        match cmd {
            Command::Join { entity, reply } => {
                let result = CombatEngine::new(&mut self.state)
                    .join(entity)
                    .map_err(Into::into);
                if result.is_ok() {
                    debug!(target: "runtime::authority", %entity, "combatant joined");
                }
                if reply.send(result).is_err() {
                    debug!(target: "runtime::authority", "Join reply channel closed");
                }
            }
            Command::Leave { entity, reply } => {
                let outcome = CombatEngine::new(&mut self.state).leave(entity, now);
                let result = match outcome {
                    Ok(signals) => {
                        debug!(target: "runtime::authority", %entity, "combatant left");
                        self.publish(signals);
                        Ok(())
                    }
                    Err(error) => Err(error.into()),
                };
                if reply.send(result).is_err() {
                    debug!(target: "runtime::authority", "Leave reply channel closed");
                }
            }
            Command::ActivateBlock { entity, reply } => {
                let outcome = CombatEngine::new(&mut self.state).activate_block(entity, now);
                let result = match outcome {
                    Ok(signals) => {
                        self.publish(signals);
                        Ok(())
                    }
                    Err(error) => {
                        debug!(
                            target: "runtime::authority",
                            %entity,
                            %error,
                            "activation rejected"
                        );
                        Err(error.into())
                    }
                };
                if reply.send(result).is_err() {
                    debug!(target: "runtime::authority", "ActivateBlock reply channel closed");
                }
            }
            Command::ReleaseBlock { entity, reply } => {
                let outcome = CombatEngine::new(&mut self.state).release_block(entity, now);
                let result = match outcome {
                    Ok(signals) => {
                        self.publish(signals);
                        Ok(())
                    }
                    Err(error) => Err(error.into()),
                };
                if reply.send(result).is_err() {
                    debug!(target: "runtime::authority", "ReleaseBlock reply channel closed");
                }
            }
            Command::SubmitHit { event, reply } => {
                let facing = Arc::clone(&self.facing);
                let (verdict, signals) =
                    CombatEngine::new(&mut self.state).resolve_hit(&event, facing.as_ref(), now);
                debug!(
                    target: "runtime::authority",
                    swing = %event.swing_id,
                    outcome = %verdict.outcome,
                    declared = %event.declared_outcome,
                    "swing resolved"
                );
                self.publish(signals);
                if reply.send(Ok(verdict)).is_err() {
                    debug!(target: "runtime::authority", "SubmitHit reply channel closed");
                }
            }
            Command::ReportZeroHealth {
                entity,
                prior_health_fraction,
                reply,
            } => {
                let outcome = CombatEngine::new(&mut self.state).report_zero_health(
                    entity,
                    prior_health_fraction,
                    now,
                );
                let result = match outcome {
                    Ok((decision, signals)) => {
                        self.publish(signals);
                        Ok(decision)
                    }
                    Err(error) => Err(error.into()),
                };
                if reply.send(result).is_err() {
                    debug!(target: "runtime::authority", "ReportZeroHealth reply channel closed");
                }
            }
            Command::QuerySnapshot { reply } => {
                if reply.send(self.state.combatants.clone()).is_err() {
                    debug!(target: "runtime::authority", "QuerySnapshot reply channel closed");
                }
            }
            Command::QueryNow { reply } => {
                if reply.send(now).is_err() {
                    debug!(target: "runtime::authority", "QueryNow reply channel closed");
                }
            }
        }
    }

    fn publish(&self, signals: Vec<Signal>) {
        for signal in signals {
            if let Signal::SuspiciousClaim {
                swing_id,
                attacker,
                declared_parry_start,
                authoritative_parry_start,
            } = &signal
            {
                warn!(
                    target: "runtime::authority",
                    swing = %swing_id,
                    %attacker,
                    ?declared_parry_start,
                    ?authoritative_parry_start,
                    "peer claim out of tolerance, downgraded to authoritative outcome"
                );
            }
            self.event_bus.publish(event_for(signal));
        }
    }
}
