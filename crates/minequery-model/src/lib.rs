//! Minequery schema model
//!
//! Describes the object graph that path queries are written against:
//! classes, their attributes, and the references/collections linking them.
//! Queries never own a model; they share one read-only `Arc<Model>`.
//!
//! - `model`: class/field descriptors, validation, JSON loading
//! - `path`: dotted path resolution (`Gene.organism.name`)

pub mod model;
pub mod path;

pub use model::{AttributeType, ClassDescriptor, FieldDescriptor, FieldKind, Model, ModelError, Name};
pub use path::{Path, PathError};
