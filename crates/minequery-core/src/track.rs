//! Usage tracking records.
//!
//! A track is a small tuple written to a tracker table each time something is
//! used. Storage is not handled here; records only know their table, their
//! column order, and whether they are fit to be stored.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const QUERY_TRACKER_TABLE: &str = "querytrack";

/// One column of a formatted track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackField {
    Text(Option<String>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

pub trait Track {
    fn table_name(&self) -> &'static str;

    /// Whether the record may be stored. Invalid records are dropped by the
    /// caller, not raised as errors.
    fn validate(&self) -> bool;

    /// Column values in table order.
    fn formatted_track(&self) -> Vec<TrackField>;

    fn timestamp(&self) -> i64;

    fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp()).single()
    }
}

/// Records that a query of some type was run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTrack {
    query_type: Option<String>,
    timestamp: i64,
}

impl QueryTrack {
    pub fn new(query_type: Option<String>, timestamp: i64) -> Self {
        Self {
            query_type,
            timestamp,
        }
    }

    /// Stamped with the current UTC time.
    pub fn now(query_type: impl Into<String>) -> Self {
        Self::new(Some(query_type.into()), Utc::now().timestamp_millis())
    }

    pub fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }
}

impl Track for QueryTrack {
    fn table_name(&self) -> &'static str {
        QUERY_TRACKER_TABLE
    }

    fn validate(&self) -> bool {
        self.query_type.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn formatted_track(&self) -> Vec<TrackField> {
        vec![
            TrackField::Text(self.query_type.clone()),
            TrackField::Timestamp(self.timestamp),
        ]
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}
