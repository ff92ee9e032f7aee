//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Check-in as handed to the record sink.
///
/// Battery fields are present only when the user opted in to sharing
/// telemetry; absent fields are omitted from the serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckIn {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_charging: Option<bool>,
}

impl NewCheckIn {
    pub fn new(user_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            battery_level: None,
            is_charging: None,
        }
    }

    /// Attach battery telemetry
    pub fn with_battery(mut self, level: u8, charging: bool) -> Self {
        self.battery_level = Some(level);
        self.is_charging = Some(charging);
        self
    }
}

/// Persisted check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub id: i64,
    #[serde(flatten)]
    pub check_in: NewCheckIn,
}

/// Destination for completed check-ins
pub trait RecordSink: Send + Sync {
    /// Persist one check-in
    fn insert(
        &self,
        check_in: NewCheckIn,
    ) -> impl Future<Output = Result<CheckInRecord, StorageError>> + Send;
}

impl<T: RecordSink> RecordSink for Arc<T> {
    fn insert(
        &self,
        check_in: NewCheckIn,
    ) -> impl Future<Output = Result<CheckInRecord, StorageError>> + Send {
        (**self).insert(check_in)
    }
}

struct Inner {
    records: VecDeque<CheckInRecord>,
    next_id: i64,
}

/// Repository for check-ins (in-memory)
pub struct Repository {
    inner: Mutex<Inner>,
    /// Max records kept across all users
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_retention(10_000)
    }

    /// Create a repository keeping at most `max_records` check-ins
    pub fn with_retention(max_records: usize) -> Self {
        info!("Creating in-memory check-in repository (retention {})", max_records);
        Self {
            inner: Mutex::new(Inner {
                records: VecDeque::with_capacity(max_records.min(1024)),
                next_id: 1,
            }),
            max_records: max_records.max(1),
        }
    }

    /// Store a check-in and assign its ID
    pub fn insert_check_in(&self, check_in: NewCheckIn) -> Result<CheckInRecord, StorageError> {
        if check_in.user_id.trim().is_empty() {
            return Err(StorageError::InvalidRecord("empty user id".into()));
        }
        if let Some(level) = check_in.battery_level {
            if level > 100 {
                return Err(StorageError::InvalidRecord(format!(
                    "battery level out of range: {}",
                    level
                )));
            }
        }

        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let record = CheckInRecord {
            id: inner.next_id,
            check_in,
        };
        inner.next_id += 1;

        // Enforce retention
        while inner.records.len() >= self.max_records {
            inner.records.pop_front();
        }

        inner.records.push_back(record.clone());
        debug!("Inserted check-in {} for {}", record.id, record.check_in.user_id);
        Ok(record)
    }

    /// Most recent check-in of a user
    pub fn latest(&self, user_id: &str) -> Result<Option<CheckInRecord>, StorageError> {
        Ok(self.history(user_id, 1)?.into_iter().next())
    }

    /// Check-ins of a user, newest first
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<CheckInRecord>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let mut records: Vec<_> = inner
            .records
            .iter()
            .filter(|r| r.check_in.user_id == user_id)
            .cloned()
            .collect();
        // Insertion order is not guaranteed to follow timestamps
        records.sort_by(|a, b| {
            b.check_in
                .timestamp
                .cmp(&a.check_in.timestamp)
                .then(b.id.cmp(&a.id))
        });
        records.truncate(limit);
        Ok(records)
    }

    /// Get a check-in by ID
    pub fn get(&self, id: i64) -> Result<CheckInRecord, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        inner
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Get total check-in count
    pub fn count(&self) -> usize {
        self.inner.lock().map(|i| i.records.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.records.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for Repository {
    async fn insert(&self, check_in: NewCheckIn) -> Result<CheckInRecord, StorageError> {
        self.insert_check_in(check_in)
    }
}
