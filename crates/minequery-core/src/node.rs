use crate::constraint::Constraint;
use serde::{Deserialize, Serialize};

/// A constrained path inside a query. Identity is the path string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    path: String,
    constraints: Vec<Constraint>,
}

impl PathNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Constraints in the order they were attached.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn editable_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_editable())
    }

    pub fn has_editable_constraints(&self) -> bool {
        self.constraints.iter().any(Constraint::is_editable)
    }

    pub(crate) fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn constraint_mut(&mut self, index: usize) -> Option<&mut Constraint> {
        self.constraints.get_mut(index)
    }

    /// Drop every editable constraint, keeping the fixed ones in order.
    pub(crate) fn remove_editable_constraints(&mut self) {
        self.constraints.retain(|c| !c.is_editable());
    }
}
