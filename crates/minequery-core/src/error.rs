use crate::constraint::ConstraintError;
use minequery_model::PathError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error("path `{path}` is rooted at `{root}`, but the query is rooted at `{query_root}`")]
    RootMismatch {
        path: String,
        root: String,
        query_root: String,
    },
    #[error("query has no node `{0}`")]
    UnknownNode(String),
    #[error("node `{path}` has no constraint at index {index}")]
    UnknownConstraint { path: String, index: usize },
    /// Raised by the execution backend; passed through untouched.
    #[error("query execution failed: {0}")]
    Executor(#[source] BoxError),
}
