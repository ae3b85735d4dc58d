//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and the combat engine so clients
//! can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Activation(#[from] combat_core::ActivationError),

    #[error(transparent)]
    Engine(#[from] combat_core::EngineError),

    #[error("authority worker command channel closed")]
    CommandChannelClosed,

    #[error("authority worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("authority worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
