//! Cloneable façade over the authority worker.

use tokio::sync::{broadcast, mpsc, oneshot};

use combat_core::ZeroHealthOutcome;
use combat_core::resolve::{HitEvent, Verdict};
use combat_core::state::{CombatantsState, EntityId, Timestamp};

use crate::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::worker::Command;

/// Handle for driving the authoritative combat simulation.
///
/// Cheap to clone; every clone talks to the same worker. Dropping all
/// clones shuts the worker down.
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Subscribes to one event topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Creates combat state for a joining entity.
    pub async fn join(&self, entity: EntityId) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Join { entity, reply }).await?;
        Self::recv(rx).await?
    }

    /// Destroys an entity's combat state, cancelling its pending deadlines.
    pub async fn leave(&self, entity: EntityId) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Leave { entity, reply }).await?;
        Self::recv(rx).await?
    }

    /// Requests a defensive activation for an entity.
    pub async fn activate_block(&self, entity: EntityId) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ActivateBlock { entity, reply }).await?;
        Self::recv(rx).await?
    }

    /// Releases an entity's defensive hold.
    pub async fn release_block(&self, entity: EntityId) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ReleaseBlock { entity, reply }).await?;
        Self::recv(rx).await?
    }

    /// Submits a swing for authoritative resolution and returns the final
    /// verdict. Idempotent per swing id.
    pub async fn submit_hit(&self, event: HitEvent) -> Result<Verdict> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitHit { event, reply }).await?;
        Self::recv(rx).await?
    }

    /// Forwards a zero-health report from the health collaborator.
    pub async fn report_zero_health(
        &self,
        entity: EntityId,
        prior_health_fraction: f32,
    ) -> Result<ZeroHealthOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ReportZeroHealth {
            entity,
            prior_health_fraction,
            reply,
        })
        .await?;
        Self::recv(rx).await?
    }

    /// Read-only snapshot of every combatant's state.
    pub async fn snapshot(&self) -> Result<CombatantsState> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::QuerySnapshot { reply }).await?;
        Self::recv(rx).await
    }

    /// Current authoritative match time.
    pub async fn now(&self) -> Result<Timestamp> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::QueryNow { reply }).await?;
        Self::recv(rx).await
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
