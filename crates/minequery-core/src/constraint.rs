//! Constraints: a single predicate attached to a path node.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Contains,
    Like,
    Lookup,
    OneOf,
    NoneOf,
    IsNull,
    IsNotNull,
}

/// How many operand values an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    One,
    /// One or more.
    Many,
}

impl ConstraintOp {
    pub const ALL: [Self; 13] = [
        Self::Equals,
        Self::NotEquals,
        Self::LessThan,
        Self::LessThanEquals,
        Self::GreaterThan,
        Self::GreaterThanEquals,
        Self::Contains,
        Self::Like,
        Self::Lookup,
        Self::OneOf,
        Self::NoneOf,
        Self::IsNull,
        Self::IsNotNull,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessThanEquals => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEquals => ">=",
            Self::Contains => "CONTAINS",
            Self::Like => "LIKE",
            Self::Lookup => "LOOKUP",
            Self::OneOf => "ONE OF",
            Self::NoneOf => "NONE OF",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    pub const fn arity(self) -> Arity {
        match self {
            Self::IsNull | Self::IsNotNull => Arity::None,
            Self::OneOf | Self::NoneOf => Arity::Many,
            _ => Arity::One,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ConstraintOp {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConstraintError::UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("unknown constraint operator `{0}`")]
    UnknownOperator(String),
    #[error("operator `{op}` expects {expected}, got {actual} value(s)")]
    Arity {
        op: ConstraintOp,
        expected: &'static str,
        actual: usize,
    },
}

/// A predicate on a node: operator, operand values, and whether a template
/// user may change it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    op: ConstraintOp,
    values: Vec<Value>,
    editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
    /// Short label (`A`, `B`, ...) referenced from constraint logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl Constraint {
    pub fn new(op: ConstraintOp, values: Vec<Value>) -> Result<Self, ConstraintError> {
        let expected = match op.arity() {
            Arity::None if !values.is_empty() => Some("no value"),
            Arity::One if values.len() != 1 => Some("exactly one value"),
            Arity::Many if values.is_empty() => Some("at least one value"),
            _ => None,
        };
        if let Some(expected) = expected {
            return Err(ConstraintError::Arity {
                op,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            op,
            values,
            editable: false,
            description: None,
            identifier: None,
            code: None,
        })
    }

    /// Single-operand shorthand.
    pub fn single(op: ConstraintOp, value: impl Into<Value>) -> Result<Self, ConstraintError> {
        Self::new(op, vec![value.into()])
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn op(&self) -> ConstraintOp {
        self.op
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// First operand, if any.
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        match self.values.as_slice() {
            [] => {}
            [single] => write!(f, " {single}")?,
            many => {
                let joined: Vec<String> = many.iter().map(Value::to_string).collect();
                write!(f, " [{}]", joined.join(", "))?;
            }
        }
        if self.editable {
            f.write_str(" (editable)")?;
        }
        Ok(())
    }
}
