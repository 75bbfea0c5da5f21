//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::cache::DateRange;

const MAX_PATTERN_LEN: usize = 256;

/// Request body for pattern invalidation (POST /invalidate)
///
/// # Fields
/// - `pattern`: Substring; every key containing it is removed
/// - `instances`: Instance names to target, all instances when omitted
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
    #[serde(default)]
    pub instances: Option<Vec<String>>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_PATTERN_LEN {
            return Some(format!(
                "Pattern exceeds maximum length of {MAX_PATTERN_LEN} characters"
            ));
        }
        None
    }
}

/// Request body announcing a changed record (POST /records/changed)
///
/// `start` and `end` bound the dates the record touches; both or neither.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordChangedRequest {
    pub subject_id: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl RecordChangedRequest {
    pub fn validate(&self) -> Option<String> {
        if self.subject_id.is_empty() {
            return Some("Subject id cannot be empty".to_string());
        }
        if self.start.is_some() != self.end.is_some() {
            return Some("Both start and end are required for a date range".to_string());
        }
        None
    }

    pub fn affected_range(&self) -> Option<DateRange> {
        Some(DateRange::new(self.start?, self.end?))
    }
}
