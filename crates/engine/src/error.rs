use std::fmt;

use crate::row::RowId;

/// Errors surfaced to the shell. None of these are fatal: the grid stays
/// interactive after any single failed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Edit value fails type coercion for its column. Rejected before any
    /// commit is attempted.
    Validation { row_id: RowId, column_key: String, reason: String },
    /// A commit or resolve references a row no longer in the store.
    NotFound { row_id: RowId },
    /// The external commit call rejected.
    Transport { reason: String },
    /// Change event missing required fields. Dropped and reported, never
    /// applied.
    MalformedEvent { reason: String },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { row_id, column_key, reason } => {
                write!(f, "row {row_id}, column '{column_key}': {reason}")
            }
            Self::NotFound { row_id } => write!(f, "row {row_id} no longer exists"),
            Self::Transport { reason } => write!(f, "commit rejected: {reason}"),
            Self::MalformedEvent { reason } => write!(f, "malformed change event: {reason}"),
        }
    }
}

impl std::error::Error for GridError {}
