//! Transition log.
//!
//! Keeps a bounded, in-memory record of committed transitions for
//! diagnostics. Older records are evicted once the capacity is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use framefsm::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     machine: "Root".to_string(),
///     from: "Idle".to_string(),
///     to: "Active".to_string(),
///     frame: 12,
///     timestamp: Utc::now(),
///     explicit_data: false,
/// };
/// assert_eq!(record.to, "Active");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Machine the transition happened in
    pub machine: String,
    /// The state being left
    pub from: String,
    /// The state being entered
    pub to: String,
    /// Controller frame at commit time
    pub frame: u64,
    /// Wall-clock commit time
    pub timestamp: DateTime<Utc>,
    /// Whether the attached data came from an explicit transfer
    pub explicit_data: bool,
}

/// Ordered, bounded log of transitions.
///
/// # Example
///
/// ```rust
/// use framefsm::core::{TransitionLog, TransitionRecord};
/// use chrono::Utc;
///
/// let mut log = TransitionLog::with_capacity(8);
/// for (from, to) in [("__ENTER", "Idle"), ("Idle", "Active")] {
///     log.record(TransitionRecord {
///         machine: "Root".to_string(),
///         from: from.to_string(),
///         to: to.to_string(),
///         frame: 0,
///         timestamp: Utc::now(),
///         explicit_data: false,
///     });
/// }
///
/// assert_eq!(log.path(), vec!["__ENTER", "Idle", "Active"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl TransitionLog {
    /// Create a log keeping at most `capacity` records.
    ///
    /// A capacity of zero records nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// State names traversed across the retained records.
    ///
    /// Starts with the `from` of the oldest record, then the `to` of each.
    /// Records from different machines are interleaved as they happened.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Wall-clock time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
