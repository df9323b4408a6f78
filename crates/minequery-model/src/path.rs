//! Dotted paths into a [`Model`].
//!
//! `Gene.organism.name` starts at the root class `Gene`, follows the
//! `organism` reference into `Organism`, and ends at its `name` attribute.
//! A path is resolved once against the model; the resolved chain is kept on
//! the value so later lookups never go back to the model.

use crate::model::{FieldDescriptor, Model, Name};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("{path} is not a valid path: empty path segment")]
    EmptySegment { path: String },
    #[error("{path} is not a valid path: unknown class `{class}`")]
    UnknownClass { path: String, class: Name },
    #[error("{path} is not a valid path: class `{class}` has no field `{field}`")]
    UnknownField {
        path: String,
        class: Name,
        field: Name,
    },
    #[error("{path} is not a valid path: attribute `{field}` cannot be traversed")]
    ThroughAttribute { path: String, field: Name },
}

/// A resolved path.
///
/// `classes[0]` is the root. `classes[i + 1]` is the class reached after
/// following `fields[i]`; for an attribute end the last class is repeated, so
/// `classes.len() == fields.len() + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    text: String,
    classes: Vec<Name>,
    fields: Vec<FieldDescriptor>,
}

impl Path {
    pub fn resolve(model: &Model, text: &str) -> Result<Self, PathError> {
        let mut segments = text.split('.');
        let root = segments.next().unwrap_or_default();
        if root.is_empty() {
            return Err(PathError::EmptySegment {
                path: text.to_string(),
            });
        }
        if model.class(root).is_none() {
            return Err(PathError::UnknownClass {
                path: text.to_string(),
                class: root.to_string(),
            });
        }

        let mut classes = vec![root.to_string()];
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(PathError::EmptySegment {
                    path: text.to_string(),
                });
            }
            if let Some(previous) = fields.last() {
                if previous.is_attribute() {
                    return Err(PathError::ThroughAttribute {
                        path: text.to_string(),
                        field: previous.name.clone(),
                    });
                }
            }
            let current = classes.last().map(String::as_str).unwrap_or(root);
            let field = model
                .field(current, segment)
                .ok_or_else(|| PathError::UnknownField {
                    path: text.to_string(),
                    class: current.to_string(),
                    field: segment.to_string(),
                })?
                .clone();
            let next = field
                .referenced_type()
                .map(str::to_string)
                .unwrap_or_else(|| current.to_string());
            fields.push(field);
            classes.push(next);
        }

        Ok(Self {
            text: text.to_string(),
            classes,
            fields,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn root_class(&self) -> &str {
        &self.classes[0]
    }

    /// True for a bare class path such as `Gene`.
    pub fn is_root_path(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn end_field(&self) -> Option<&FieldDescriptor> {
        self.fields.last()
    }

    pub fn end_is_attribute(&self) -> bool {
        self.end_field().map(FieldDescriptor::is_attribute).unwrap_or(false)
    }

    pub fn end_is_reference(&self) -> bool {
        self.end_field().map(FieldDescriptor::is_reference).unwrap_or(false)
    }

    pub fn end_is_collection(&self) -> bool {
        self.end_field().map(FieldDescriptor::is_collection).unwrap_or(false)
    }

    /// Class at the end of the path: the owner of an attribute end, or the
    /// referenced class of a reference/collection end.
    pub fn last_class(&self) -> &str {
        &self.classes[self.classes.len() - 1]
    }

    /// Class that declares the terminal field (one level above a terminal
    /// reference or collection). `None` for a root path.
    pub fn second_last_class(&self) -> Option<&str> {
        if self.is_root_path() {
            None
        } else {
            Some(&self.classes[self.classes.len() - 2])
        }
    }

    /// Path with the terminal segment removed; `None` for a root path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root_path() {
            return None;
        }
        let cut = self.text.rfind('.').unwrap_or(self.text.len());
        let mut classes = self.classes.clone();
        classes.pop();
        let mut fields = self.fields.clone();
        fields.pop();
        Some(Self {
            text: self.text[..cut].to_string(),
            classes,
            fields,
        })
    }

    /// Number of fields traversed from the root.
    pub fn depth(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
