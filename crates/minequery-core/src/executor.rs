//! Execution backend contract.
//!
//! The core never runs queries itself. Summarisation hands a bounded
//! precompute query to a [`QueryExecutor`] and reads back rows.

use crate::query::PathQuery;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

pub type ResultRow = Vec<Value>;

/// Paging and planning options for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub offset: usize,
    pub limit: usize,
    /// Let the backend use precomputed tables.
    pub optimise: bool,
    pub explain: bool,
    /// Return each distinct row once, keeping first occurrences in order.
    pub distinct: bool,
    /// Backend consistency token, when the backend hands one out.
    pub sequence: Option<u64>,
}

impl ExecuteRequest {
    pub const fn page(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            optimise: true,
            explain: false,
            distinct: false,
            sequence: None,
        }
    }
}

pub trait QueryExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `query` and return at most `request.limit` rows starting at
    /// `request.offset`. Each row follows the query's view order.
    ///
    /// When `request.distinct` is set, duplicate rows must be removed before
    /// paging is applied.
    fn execute(&self, query: &PathQuery, request: &ExecuteRequest)
        -> Result<Vec<ResultRow>, Self::Error>;

    /// Current consistency token, if the backend has one.
    fn sequence(&self) -> Option<u64> {
        None
    }
}

// ============================================================================
// Static (fixture) executor
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StaticExecutorError {
    #[error("query has an empty view")]
    EmptyView,
    #[error("no rows registered for `{0}`")]
    Unavailable(String),
}

/// One recorded call to [`StaticExecutor::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExecution {
    pub view: Vec<String>,
    pub request: ExecuteRequest,
    pub query: PathQuery,
}

/// Serves canned rows keyed by the first projected path.
///
/// Used by tests and by the CLI's fixture-driven summarise. Every call is
/// recorded so callers can inspect what was asked for.
#[derive(Debug, Default)]
pub struct StaticExecutor {
    rows: HashMap<String, Vec<ResultRow>>,
    failing: Vec<String>,
    sequence: Option<u64>,
    calls: Mutex<Vec<RecordedExecution>>,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures shaped as `{"Gene.length": [[1], [2]]}`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let rows: HashMap<String, Vec<ResultRow>> = serde_json::from_str(text)?;
        Ok(Self {
            rows,
            ..Self::default()
        })
    }

    pub fn with_rows(mut self, path: impl Into<String>, rows: Vec<ResultRow>) -> Self {
        self.rows.insert(path.into(), rows);
        self
    }

    /// Single-column rows, one per value.
    pub fn with_column(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.with_rows(path, values.into_iter().map(|v| vec![v]).collect())
    }

    /// Make queries projecting `path` fail.
    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.push(path.into());
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn calls(&self) -> Vec<RecordedExecution> {
        self.calls.lock().clone()
    }
}

impl QueryExecutor for StaticExecutor {
    type Error = StaticExecutorError;

    fn execute(
        &self,
        query: &PathQuery,
        request: &ExecuteRequest,
    ) -> Result<Vec<ResultRow>, Self::Error> {
        self.calls.lock().push(RecordedExecution {
            view: query.view().to_vec(),
            request: *request,
            query: query.clone(),
        });

        let first = query.view().first().ok_or(StaticExecutorError::EmptyView)?;
        if self.failing.iter().any(|p| p == first) {
            return Err(StaticExecutorError::Unavailable(first.clone()));
        }
        let rows = self.rows.get(first).map(Vec::as_slice).unwrap_or_default();
        let mut seen: Vec<&ResultRow> = Vec::new();
        Ok(rows
            .iter()
            .filter(|row| {
                if !request.distinct {
                    return true;
                }
                if seen.contains(row) {
                    return false;
                }
                seen.push(*row);
                true
            })
            .skip(request.offset)
            .take(request.limit)
            .cloned()
            .collect())
    }

    fn sequence(&self) -> Option<u64> {
        self.sequence
    }
}
