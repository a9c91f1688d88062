//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by the read-side statistics queries.
///
/// The session lifecycle methods (`start_session`/`record_answer`/
/// `end_session`) never surface storage failures; only the dashboard
/// queries propagate them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsQueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
