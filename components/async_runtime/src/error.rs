//! Error types for the async runtime.

use thiserror::Error;

/// A deferred was asked to adopt its own outcome.
///
/// This happens when a continuation returns the very deferred its `then` call
/// produced, or when a resolve handle is called with its own deferred. It is a
/// programming mistake, so it is raised out of the event loop instead of being
/// turned into a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chaining cycle detected: deferred #{deferred_id} cannot adopt itself")]
pub struct ChainCycleError {
    /// Identifier of the deferred that tried to adopt itself
    pub deferred_id: u64,
}

/// Errors surfaced by running the event loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A settlement task hit a chaining cycle
    #[error(transparent)]
    ChainCycle(#[from] ChainCycleError),

    /// The loop ran `limit` tasks without draining its queue
    #[error("event loop exceeded {limit} turns without becoming idle")]
    TurnLimitExceeded {
        /// The configured turn limit
        limit: usize,
    },
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
