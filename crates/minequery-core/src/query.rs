//! Path queries: an ordered set of constrained nodes plus a projection.

use crate::constraint::Constraint;
use crate::error::QueryError;
use crate::node::PathNode;
use minequery_model::{Model, Path};
use std::sync::Arc;

/// An ordered mapping from path string to [`PathNode`], plus the list of
/// projected (view) paths.
///
/// `Clone` is deep: nodes and constraints are owned values, and the only
/// state shared with the clone is the read-only `Arc<Model>`.
#[derive(Debug, Clone)]
pub struct PathQuery {
    model: Arc<Model>,
    nodes: Vec<PathNode>,
    view: Vec<String>,
    constraint_logic: Option<String>,
}

impl PartialEq for PathQuery {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.model, &other.model) || self.model == other.model)
            && self.nodes == other.nodes
            && self.view == other.view
            && self.constraint_logic == other.constraint_logic
    }
}

impl PathQuery {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            nodes: Vec::new(),
            view: Vec::new(),
            constraint_logic: None,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Root class shared by every path in the query, once one has been added.
    pub fn root_class(&self) -> Option<&str> {
        self.view
            .first()
            .map(String::as_str)
            .or_else(|| self.nodes.first().map(PathNode::path))
            .map(|p| p.split('.').next().unwrap_or(p))
    }

    /// Resolve `path` against the model and check it shares the query root.
    pub fn resolve_path(&self, path: &str) -> Result<Path, QueryError> {
        let resolved = Path::resolve(&self.model, path)?;
        if let Some(query_root) = self.root_class() {
            if resolved.root_class() != query_root {
                return Err(QueryError::RootMismatch {
                    path: path.to_string(),
                    root: resolved.root_class().to_string(),
                    query_root: query_root.to_string(),
                });
            }
        }
        Ok(resolved)
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    /// Insert `node`, replacing any node with the same path. A replaced key
    /// moves to the end of the iteration order. Returns the replaced node.
    pub fn add_or_replace_node(&mut self, node: PathNode) -> Result<Option<PathNode>, QueryError> {
        self.resolve_path(node.path())?;
        let previous = self
            .nodes
            .iter()
            .position(|n| n.path() == node.path())
            .map(|i| self.nodes.remove(i));
        self.nodes.push(node);
        Ok(previous)
    }

    /// Attach `constraint` to the node at `path`, creating the node if needed.
    pub fn add_constraint(&mut self, path: &str, constraint: Constraint) -> Result<(), QueryError> {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.path() == path) {
            node.push_constraint(constraint);
            return Ok(());
        }
        self.add_or_replace_node(PathNode::new(path).with_constraint(constraint))?;
        Ok(())
    }

    pub fn remove_node(&mut self, path: &str) -> Option<PathNode> {
        let index = self.nodes.iter().position(|n| n.path() == path)?;
        Some(self.nodes.remove(index))
    }

    pub fn node(&self, path: &str) -> Option<&PathNode> {
        self.nodes.iter().find(|n| n.path() == path)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &PathNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Explicitly flip the editable flag of one constraint.
    pub fn set_constraint_editable(
        &mut self,
        path: &str,
        index: usize,
        editable: bool,
    ) -> Result<(), QueryError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.path() == path)
            .ok_or_else(|| QueryError::UnknownNode(path.to_string()))?;
        let constraint = node
            .constraint_mut(index)
            .ok_or_else(|| QueryError::UnknownConstraint {
                path: path.to_string(),
                index,
            })?;
        constraint.set_editable(editable);
        Ok(())
    }

    /// Strip editable constraints from every node. Nodes themselves stay.
    pub(crate) fn remove_editable_constraints(&mut self) {
        for node in &mut self.nodes {
            node.remove_editable_constraints();
        }
    }

    // ------------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------------

    /// Append a projected path. Adding a path already in the view is a no-op.
    pub fn add_view(&mut self, path: &str) -> Result<(), QueryError> {
        self.resolve_path(path)?;
        if !self.view.iter().any(|v| v == path) {
            self.view.push(path.to_string());
        }
        Ok(())
    }

    pub fn view(&self) -> &[String] {
        &self.view
    }

    pub fn clear_view(&mut self) {
        self.view.clear();
    }

    pub fn constraint_logic(&self) -> Option<&str> {
        self.constraint_logic.as_deref()
    }

    pub fn set_constraint_logic(&mut self, logic: Option<String>) {
        self.constraint_logic = logic;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintOp;
    use minequery_model::{AttributeType, ClassDescriptor};

    fn model() -> Arc<Model> {
        Arc::new(
            Model::new(
                "genomic",
                [
                    ClassDescriptor::new("Gene")
                        .with_attribute("symbol", AttributeType::String)
                        .with_attribute("length", AttributeType::Integer)
                        .with_reference("organism", "Organism"),
                    ClassDescriptor::new("Organism").with_attribute("name", AttributeType::String),
                ],
            )
            .expect("model"),
        )
    }

    fn eq(value: &str) -> Constraint {
        Constraint::single(ConstraintOp::Equals, value).expect("constraint")
    }

    #[test]
    fn replacing_a_node_moves_it_last() {
        let mut q = PathQuery::new(model());
        q.add_constraint("Gene.symbol", eq("eve")).expect("add");
        q.add_constraint("Gene.organism.name", eq("H. sapiens"))
            .expect("add");
        let replaced = q
            .add_or_replace_node(PathNode::new("Gene.symbol"))
            .expect("replace");
        assert_eq!(replaced.map(|n| n.constraints().len()), Some(1));

        let order: Vec<&str> = q.nodes().map(PathNode::path).collect();
        assert_eq!(order, ["Gene.organism.name", "Gene.symbol"]);
        assert!(q.node("Gene.symbol").expect("node").constraints().is_empty());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn add_constraint_appends_to_existing_node() {
        let mut q = PathQuery::new(model());
        q.add_constraint("Gene.symbol", eq("a")).expect("add");
        q.add_constraint("Gene.symbol", eq("b")).expect("add");
        let values: Vec<String> = q
            .node("Gene.symbol")
            .expect("node")
            .constraints()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(values, ["= a", "= b"]);
    }

    #[test]
    fn rejects_invalid_and_foreign_rooted_paths() {
        let mut q = PathQuery::new(model());
        assert!(matches!(
            q.add_constraint("Gene.width", eq("x")),
            Err(QueryError::Path(_))
        ));
        q.add_view("Gene.symbol").expect("view");
        assert!(matches!(
            q.add_constraint("Organism.name", eq("x")),
            Err(QueryError::RootMismatch { .. })
        ));
    }

    #[test]
    fn view_ignores_duplicates() {
        let mut q = PathQuery::new(model());
        q.add_view("Gene.symbol").expect("view");
        q.add_view("Gene.length").expect("view");
        q.add_view("Gene.symbol").expect("view");
        assert_eq!(q.view(), ["Gene.symbol", "Gene.length"]);
        q.clear_view();
        assert!(q.view().is_empty());
    }

    #[test]
    fn clone_is_isolated_from_source() {
        let mut q = PathQuery::new(model());
        q.add_constraint("Gene.symbol", eq("eve")).expect("add");
        let mut copy = q.clone();
        assert_eq!(copy, q);
        assert!(Arc::ptr_eq(copy.model(), q.model()));

        copy.set_constraint_editable("Gene.symbol", 0, true)
            .expect("edit");
        copy.add_constraint("Gene.length", Constraint::single(ConstraintOp::LessThan, 10_i64).expect("c"))
            .expect("add");

        assert!(!q.node("Gene.symbol").expect("node").constraints()[0].is_editable());
        assert!(q.node("Gene.length").is_none());
        assert_ne!(copy, q);
    }

    #[test]
    fn editing_missing_constraints_reports_what_is_missing() {
        let mut q = PathQuery::new(model());
        q.add_constraint("Gene.symbol", eq("eve")).expect("add");
        assert!(matches!(
            q.set_constraint_editable("Gene.length", 0, true),
            Err(QueryError::UnknownNode(_))
        ));
        assert!(matches!(
            q.set_constraint_editable("Gene.symbol", 3, true),
            Err(QueryError::UnknownConstraint { index: 3, .. })
        ));
    }
}
