//! Class and field descriptors.
//!
//! A [`Model`] is the read-only description of the object graph that queries
//! are written against. It is loaded once (usually from JSON) and then shared
//! behind an `Arc` by every query built over it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub type Name = String;

// ============================================================================
// Descriptors
// ============================================================================

/// Primitive type carried by an attribute field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Integer,
    Float,
    Boolean,
}

impl AttributeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Attribute {
        #[serde(rename = "type")]
        ty: AttributeType,
    },
    Reference {
        referenced_type: Name,
    },
    Collection {
        referenced_type: Name,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: Name,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn attribute(name: impl Into<Name>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Attribute { ty },
        }
    }

    pub fn reference(name: impl Into<Name>, referenced_type: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Reference {
                referenced_type: referenced_type.into(),
            },
        }
    }

    pub fn collection(name: impl Into<Name>, referenced_type: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Collection {
                referenced_type: referenced_type.into(),
            },
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FieldKind::Attribute { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference { .. })
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, FieldKind::Collection { .. })
    }

    /// Class a reference or collection points at; `None` for attributes.
    pub fn referenced_type(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Attribute { .. } => None,
            FieldKind::Reference { referenced_type } | FieldKind::Collection { referenced_type } => {
                Some(referenced_type)
            }
        }
    }

    pub fn attribute_type(&self) -> Option<AttributeType> {
        match self.kind {
            FieldKind::Attribute { ty } => Some(ty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: Name,
    /// Direct superclasses. Fields are inherited through this list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<Name>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn extending(mut self, superclass: impl Into<Name>) -> Self {
        self.extends.push(superclass.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<Name>, ty: AttributeType) -> Self {
        self.fields.push(FieldDescriptor::attribute(name, ty));
        self
    }

    pub fn with_reference(mut self, name: impl Into<Name>, referenced_type: impl Into<Name>) -> Self {
        self.fields
            .push(FieldDescriptor::reference(name, referenced_type));
        self
    }

    pub fn with_collection(
        mut self,
        name: impl Into<Name>,
        referenced_type: impl Into<Name>,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::collection(name, referenced_type));
        self
    }

    /// Field declared directly on this class (inherited fields excluded).
    pub fn declared_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model `{model}` declares class `{class}` more than once")]
    DuplicateClass { model: Name, class: Name },
    #[error("class `{class}` declares field `{field}` more than once")]
    DuplicateField { class: Name, field: Name },
    #[error("class `{class}` extends unknown class `{superclass}`")]
    UnknownSuperclass { class: Name, superclass: Name },
    #[error("field `{class}.{field}` references unknown class `{referenced}`")]
    UnknownReferencedType {
        class: Name,
        field: Name,
        referenced: Name,
    },
    #[error("inheritance cycle through class `{class}`")]
    InheritanceCycle { class: Name },
    #[error("invalid model JSON: {0}")]
    Json(String),
}

/// Serialized shape of a model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    name: Name,
    classes: Vec<ClassDescriptor>,
}

/// A validated schema model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: Name,
    classes: BTreeMap<Name, ClassDescriptor>,
}

impl Model {
    pub fn new(
        name: impl Into<Name>,
        classes: impl IntoIterator<Item = ClassDescriptor>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let mut by_name = BTreeMap::new();
        for class in classes {
            let mut seen = BTreeSet::new();
            for field in &class.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(ModelError::DuplicateField {
                        class: class.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            if by_name.contains_key(&class.name) {
                return Err(ModelError::DuplicateClass {
                    model: name,
                    class: class.name,
                });
            }
            by_name.insert(class.name.clone(), class);
        }

        let model = Self {
            name,
            classes: by_name,
        };
        model.check_references()?;
        model.check_inheritance()?;
        Ok(model)
    }

    /// Load a model from its JSON description:
    /// `{"name": "genomic", "classes": [{"name": "Gene", "fields": [...]}]}`.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let file: ModelFile =
            serde_json::from_str(text).map_err(|e| ModelError::Json(e.to_string()))?;
        Self::new(file.name, file.classes)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        let file = ModelFile {
            name: self.name.clone(),
            classes: self.classes.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| ModelError::Json(e.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    /// Look up a field on `class`, walking superclasses breadth-first so the
    /// nearest declaration wins.
    pub fn field(&self, class: &str, field: &str) -> Option<&FieldDescriptor> {
        let mut queue = vec![class];
        let mut visited = BTreeSet::new();
        while !queue.is_empty() {
            let mut next = Vec::new();
            for name in queue {
                if !visited.insert(name) {
                    continue;
                }
                let Some(descriptor) = self.classes.get(name) else {
                    continue;
                };
                if let Some(found) = descriptor.declared_field(field) {
                    return Some(found);
                }
                next.extend(descriptor.extends.iter().map(String::as_str));
            }
            queue = next;
        }
        None
    }

    /// True when `sub` is `sup` or inherits from it.
    pub fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        self.classes
            .get(sub)
            .map(|c| c.extends.iter().any(|parent| self.is_subclass_of(parent, sup)))
            .unwrap_or(false)
    }

    fn check_references(&self) -> Result<(), ModelError> {
        for class in self.classes.values() {
            for superclass in &class.extends {
                if !self.classes.contains_key(superclass) {
                    return Err(ModelError::UnknownSuperclass {
                        class: class.name.clone(),
                        superclass: superclass.clone(),
                    });
                }
            }
            for field in &class.fields {
                if let Some(referenced) = field.referenced_type() {
                    if !self.classes.contains_key(referenced) {
                        return Err(ModelError::UnknownReferencedType {
                            class: class.name.clone(),
                            field: field.name.clone(),
                            referenced: referenced.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_inheritance(&self) -> Result<(), ModelError> {
        // Depth-first walk with an explicit "on stack" set.
        fn visit<'a>(
            model: &'a Model,
            class: &'a str,
            on_stack: &mut BTreeSet<&'a str>,
            done: &mut BTreeSet<&'a str>,
        ) -> Result<(), ModelError> {
            if done.contains(class) {
                return Ok(());
            }
            if !on_stack.insert(class) {
                return Err(ModelError::InheritanceCycle {
                    class: class.to_string(),
                });
            }
            if let Some(descriptor) = model.classes.get(class) {
                for parent in &descriptor.extends {
                    visit(model, parent, on_stack, done)?;
                }
            }
            on_stack.remove(class);
            done.insert(class);
            Ok(())
        }

        let mut done = BTreeSet::new();
        for name in self.classes.keys() {
            visit(self, name, &mut BTreeSet::new(), &mut done)?;
        }
        Ok(())
    }
}
