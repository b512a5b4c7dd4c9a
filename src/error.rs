//! Kernel error type.
//!
//! The kernel is infallible for already-enqueued or blocking operations; the
//! only failures a caller can observe are entry-time misuse (an empty
//! `select` with no default) and OS-level thread spawn failure.

use thiserror::Error;

/// Errors produced by this crate's fallible entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// `select` was called with no receive offers, no send offers, and
    /// `default = false`. Such a call would block forever with no possible
    /// wake source, so it is rejected immediately instead.
    #[error("select called with no offers and no default clause")]
    EmptySelect,

    /// The OS refused to spawn a new thread for a task.
    #[error("failed to spawn task: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
