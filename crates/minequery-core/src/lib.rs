//! Minequery core: path queries and template queries.
//!
//! A [`PathQuery`] is an ordered set of constrained paths over a shared,
//! read-only [`Model`](minequery_model::Model). A [`TemplateQuery`] owns a
//! private copy of one plus template metadata, and marks some constraints as
//! editable so callers can fill them in later.
//!
//! ## Module Organization
//!
//! - `value`, `constraint`, `node`, `query`: the query data model
//! - `template`: editable-constraint protocol and summarisation
//! - `precompute`: bounded single-column queries used by summarisation
//! - `executor`: the execution backend contract (plus a fixture backend)
//! - `xml`: template wire format
//! - `track`: usage tracking records

pub mod constraint;
pub mod error;
pub mod executor;
pub mod node;
pub mod precompute;
pub mod query;
pub mod template;
pub mod track;
pub mod value;
pub mod xml;

pub use constraint::{Arity, Constraint, ConstraintError, ConstraintOp};
pub use error::{BoxError, QueryError};
pub use executor::{
    ExecuteRequest, QueryExecutor, RecordedExecution, ResultRow, StaticExecutor,
    StaticExecutorError,
};
pub use node::PathNode;
pub use precompute::build_precompute_query;
pub use query::PathQuery;
pub use template::{SummaryState, TemplateMetadata, TemplateQuery, SUMMARY_CUTOFF};
pub use track::{QueryTrack, Track, TrackField, QUERY_TRACKER_TABLE};
pub use value::Value;
pub use xml::{template_from_xml, template_to_xml, XmlError};
