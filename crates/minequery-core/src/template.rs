//! Template queries: saved path queries whose editable constraints are filled
//! in by the caller at use time.
//!
//! A template owns its own copy of the query it was built from. Nothing the
//! caller does to the source query afterwards is visible here, and nothing
//! reachable from a template hands out mutable access to its nodes.
//!
//! ## Summarisation
//!
//! `summarise` asks an executor for the distinct values each editable node can
//! take under the template's fixed constraints. A node's values are cached only
//! when the backend returned fewer than [`SUMMARY_CUTOFF`] rows; otherwise the
//! node is recorded as having too many values to list.

use crate::constraint::Constraint;
use crate::error::QueryError;
use crate::executor::{ExecuteRequest, QueryExecutor};
use crate::node::PathNode;
use crate::precompute::build_precompute_query;
use crate::query::PathQuery;
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// Row count at or above which a node is treated as not summarisable.
pub const SUMMARY_CUTOFF: usize = 20;

/// Descriptive fields of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMetadata {
    /// Short identifier. A template without one is invalid.
    pub name: Option<String>,
    /// One-line title for template lists.
    pub title: Option<String>,
    /// Long description shown on the template form.
    pub description: Option<String>,
    /// Private comment, never shown to template users.
    pub comment: Option<String>,
    pub important: bool,
    /// Never absent; empty when unset.
    pub keywords: String,
}

impl TemplateMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// What is known about an editable node's possible values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryState<'a> {
    /// `summarise` has not produced anything for this node.
    NotSummarised,
    /// The complete list of values, in backend order.
    Complete(&'a [Value]),
    /// The backend returned at least [`SUMMARY_CUTOFF`] rows.
    TooManyValues,
}

#[derive(Debug)]
pub struct TemplateQuery {
    metadata: TemplateMetadata,
    query: PathQuery,
    edited: bool,
    possible_values: HashMap<String, Vec<Value>>,
    over_cutoff: HashSet<String>,
}

impl Clone for TemplateQuery {
    /// Copies the query and all metadata, including `edited`. Summaries are
    /// derived data and start empty on the copy.
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            query: self.query.clone(),
            edited: self.edited,
            possible_values: HashMap::new(),
            over_cutoff: HashSet::new(),
        }
    }
}

impl PartialEq for TemplateQuery {
    /// Summaries are not part of a template's identity, same as for `Clone`.
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.query == other.query
            && self.edited == other.edited
    }
}

impl TemplateQuery {
    /// Build a template over a private copy of `query`.
    pub fn new(metadata: TemplateMetadata, query: &PathQuery) -> Self {
        Self {
            metadata,
            query: query.clone(),
            edited: false,
            possible_values: HashMap::new(),
            over_cutoff: HashSet::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    pub fn metadata(&self) -> &TemplateMetadata {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.metadata.comment.as_deref()
    }

    pub fn is_important(&self) -> bool {
        self.metadata.important
    }

    pub fn keywords(&self) -> &str {
        &self.metadata.keywords
    }

    /// True when this in-memory template has diverged from its saved original.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn set_edited(&mut self, edited: bool) {
        self.edited = edited;
    }

    /// A template is usable only with a non-empty name.
    pub fn validate(&self) -> bool {
        self.name().is_some_and(|name| !name.is_empty())
    }

    // ------------------------------------------------------------------------
    // Query access
    // ------------------------------------------------------------------------

    /// Read-only view of the embedded query.
    pub fn query(&self) -> &PathQuery {
        &self.query
    }

    /// An independent copy of the embedded query.
    pub fn path_query(&self) -> PathQuery {
        self.query.clone()
    }

    /// Change whether one constraint is editable. Any summary held for that
    /// node is dropped.
    pub fn set_constraint_editable(
        &mut self,
        path: &str,
        index: usize,
        editable: bool,
    ) -> Result<(), QueryError> {
        self.query.set_constraint_editable(path, index, editable)?;
        self.possible_values.remove(path);
        self.over_cutoff.remove(path);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Editable constraints
    // ------------------------------------------------------------------------

    /// Editable constraints on the node at `path`, in declaration order.
    /// Empty for unknown nodes.
    pub fn editable_constraints(&self, path: &str) -> Vec<&Constraint> {
        self.query
            .node(path)
            .map(|node| node.editable_constraints().collect())
            .unwrap_or_default()
    }

    /// Same as [`Self::editable_constraints`], keyed by a node.
    pub fn editable_constraints_for(&self, node: &PathNode) -> Vec<&Constraint> {
        self.editable_constraints(node.path())
    }

    /// Every editable constraint, node by node in query order. Form rendering
    /// depends on this order.
    pub fn all_editable_constraints(&self) -> Vec<&Constraint> {
        self.query
            .nodes()
            .flat_map(PathNode::editable_constraints)
            .collect()
    }

    /// Nodes carrying at least one editable constraint, in query order.
    pub fn editable_nodes(&self) -> Vec<&PathNode> {
        self.query
            .nodes()
            .filter(|node| node.has_editable_constraints())
            .collect()
    }

    /// A copy with every editable constraint removed: the query that returns
    /// all results the template could ever produce. `self` is untouched.
    pub fn clone_without_editable_constraints(&self) -> Self {
        let mut clone = self.clone();
        clone.query.remove_editable_constraints();
        clone
    }

    // ------------------------------------------------------------------------
    // Summaries
    // ------------------------------------------------------------------------

    pub fn precompute_query(&self, node: &PathNode) -> Result<PathQuery, QueryError> {
        build_precompute_query(self, None, node)
    }

    /// Compute possible values for every editable node.
    ///
    /// Each precompute query asks the backend for distinct values, so the
    /// cutoff counts distinct values rather than raw rows.
    ///
    /// Nodes are processed in query order and each node's entry is replaced
    /// in one step, so an executor failure on node *k* leaves nodes before it
    /// updated and nodes from *k* on as they were. The failure is returned
    /// unchanged.
    pub fn summarise<E: QueryExecutor>(&mut self, executor: &E) -> Result<(), QueryError> {
        let template = self.name().unwrap_or_default().to_string();
        let targets: Vec<PathNode> = self.editable_nodes().into_iter().cloned().collect();

        for node in &targets {
            let query = self.precompute_query(node)?;
            let request = ExecuteRequest {
                distinct: true,
                sequence: executor.sequence(),
                ..ExecuteRequest::page(0, SUMMARY_CUTOFF)
            };
            tracing::debug!(
                template = %template,
                node = %node.path(),
                limit = request.limit,
                "running precompute query"
            );
            let rows = executor
                .execute(&query, &request)
                .map_err(|e| QueryError::Executor(Box::new(e)))?;

            let path = node.path().to_string();
            if rows.len() < SUMMARY_CUTOFF {
                let values: Vec<Value> = rows
                    .into_iter()
                    .filter_map(|row| row.into_iter().next())
                    .collect();
                tracing::debug!(node = %path, values = values.len(), "summarised node");
                self.over_cutoff.remove(&path);
                self.possible_values.insert(path, values);
            } else {
                tracing::debug!(node = %path, "too many values to summarise");
                self.possible_values.remove(&path);
                self.over_cutoff.insert(path);
            }
        }

        tracing::info!(
            template = %template,
            summarised = self.possible_values.len(),
            over_cutoff = self.over_cutoff.len(),
            "template summary updated"
        );
        Ok(())
    }

    /// True when at least one node has a complete value list.
    pub fn is_summarised(&self) -> bool {
        !self.possible_values.is_empty()
    }

    /// Complete value list for the node at `path`. `None` means either "not
    /// summarised" or "too many values"; use [`Self::summary_state`] to tell
    /// them apart.
    pub fn possible_values(&self, path: &str) -> Option<&[Value]> {
        self.possible_values.get(path).map(Vec::as_slice)
    }

    pub fn summary_state(&self, path: &str) -> SummaryState<'_> {
        if let Some(values) = self.possible_values.get(path) {
            SummaryState::Complete(values)
        } else if self.over_cutoff.contains(path) {
            SummaryState::TooManyValues
        } else {
            SummaryState::NotSummarised
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintOp;
    use crate::executor::StaticExecutor;
    use minequery_model::{AttributeType, ClassDescriptor, Model};
    use std::sync::Arc;

    fn query() -> PathQuery {
        let model = Arc::new(
            Model::new(
                "genomic",
                [
                    ClassDescriptor::new("Gene")
                        .with_attribute("symbol", AttributeType::String)
                        .with_attribute("length", AttributeType::Integer),
                ],
            )
            .expect("model"),
        );
        let mut q = PathQuery::new(model);
        q.add_view("Gene.symbol").expect("view");
        q.add_constraint(
            "Gene.length",
            Constraint::single(ConstraintOp::GreaterThan, 10_i64)
                .expect("c")
                .editable(true),
        )
        .expect("add");
        q
    }

    #[test]
    fn keywords_default_to_empty_and_name_drives_validation() {
        let q = query();
        let unnamed = TemplateQuery::new(TemplateMetadata::default(), &q);
        assert_eq!(unnamed.keywords(), "");
        assert!(!unnamed.validate());

        let empty = TemplateQuery::new(TemplateMetadata::named(""), &q);
        assert!(!empty.validate());

        let named = TemplateQuery::new(TemplateMetadata::named("Gene"), &q);
        assert!(named.validate());
    }

    #[test]
    fn construction_copies_the_source_query() {
        let mut q = query();
        let t = TemplateQuery::new(TemplateMetadata::named("t"), &q);
        q.set_constraint_editable("Gene.length", 0, false)
            .expect("edit");
        assert_eq!(t.all_editable_constraints().len(), 1);
    }

    #[test]
    fn clone_keeps_edited_flag_but_drops_summaries() {
        let mut t = TemplateQuery::new(TemplateMetadata::named("t"), &query());
        t.set_edited(true);
        let executor = StaticExecutor::new().with_column("Gene.length", vec![Value::Integer(12)]);
        t.summarise(&executor).expect("summarise");
        assert!(t.is_summarised());

        let copy = t.clone();
        assert!(copy.is_edited());
        assert!(!copy.is_summarised());
        assert_eq!(copy.query(), t.query());
        assert_eq!(copy.metadata(), t.metadata());
    }

    #[test]
    fn equality_ignores_summaries() {
        let mut t = TemplateQuery::new(TemplateMetadata::named("t"), &query());
        let executor = StaticExecutor::new().with_column("Gene.length", vec![Value::Integer(5)]);
        t.summarise(&executor).expect("summarise");
        assert!(t.is_summarised());

        assert_eq!(t.clone(), t);
        let back = TemplateQuery::from_xml(&t.to_xml().expect("xml"), t.query().model())
            .expect("parse");
        assert_eq!(back, t);

        let mut renamed = t.clone();
        renamed.metadata.name = Some("u".to_string());
        assert_ne!(renamed, t);
    }

    #[test]
    fn changing_editability_invalidates_node_summary() {
        let mut t = TemplateQuery::new(TemplateMetadata::named("t"), &query());
        let executor = StaticExecutor::new().with_column("Gene.length", vec![Value::Integer(12)]);
        t.summarise(&executor).expect("summarise");
        t.set_constraint_editable("Gene.length", 0, false)
            .expect("edit");
        assert_eq!(t.summary_state("Gene.length"), SummaryState::NotSummarised);
        assert!(t.editable_nodes().is_empty());
    }
}
