//! Error types for dispatch and its collaborators.

use thiserror::Error;

/// Failures reported by datastore collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection could be handed out.
    #[error("connection unavailable: {0}")]
    Unavailable(String),

    /// A statement failed to run.
    #[error("query failed: {0}")]
    Query(String),

    /// A guild prefix that cannot be stored.
    #[error("invalid prefix \"{0}\": must be non-empty and contain no whitespace")]
    InvalidPrefix(String),
}

/// Errors raised while handling one command.
///
/// None of these escape [`Dispatcher::process_message`](crate::Dispatcher::process_message):
/// they are logged and turned into a [`CommandOutcome`](crate::CommandOutcome).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The platform refused or lost a reply.
    #[error("failed to deliver reply: {0}")]
    Reply(String),

    /// Datastore failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A handler gave up with its own reason.
    #[error("handler failed: {0}")]
    Handler(String),
}

/// Convenience alias for results with [`DispatchError`].
pub type Result<T> = std::result::Result<T, DispatchError>;
