//! Storage Layer
//!
//! Persists completed check-ins behind the [`RecordSink`] seam and answers
//! "when did this user last check in" queries.

mod repository;

pub use repository::{CheckInRecord, NewCheckIn, RecordSink, Repository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
