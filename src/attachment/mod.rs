//! Named, typed per-element data.
//!
//! Attachment names are bound to a value type through an
//! [`AttachmentRegistry`]. The registry is owned by the caller and handed to
//! every load that may declare or use attachments, so several loads share one
//! set of declarations while tests can use independent registries.

mod value;

pub use value::{AttachmentType, AttachmentValue, ReadFn};

use std::collections::HashMap;
use std::fmt;

use crate::error::AttachmentError;
use crate::reader::tokens::TokenStream;

/// The four element kinds of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
    Volume,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Vertex,
        ElementKind::Edge,
        ElementKind::Face,
        ElementKind::Volume,
    ];

    /// Node name used for index lists of this kind inside subsets and selectors.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            ElementKind::Vertex => "vertices",
            ElementKind::Edge => "edges",
            ElementKind::Face => "faces",
            ElementKind::Volume => "volumes",
        }
    }

    /// Node name of attachments on this kind.
    #[must_use]
    pub fn attachment_node(self) -> &'static str {
        match self {
            ElementKind::Vertex => "vertex_attachment",
            ElementKind::Edge => "edge_attachment",
            ElementKind::Face => "face_attachment",
            ElementKind::Volume => "volume_attachment",
        }
    }

    /// Inverse of [`ElementKind::attachment_node`].
    #[must_use]
    pub fn from_attachment_node(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.attachment_node() == name)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Dense attachment data, one value per element in creation order.
///
/// A column stored on a [`Grid`](crate::topology::Grid) always has one slot
/// per element of its kind. Elements created after the column get `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentColumn {
    pub type_name: String,
    pub pass_on: bool,
    pub default: AttachmentValue,
    pub values: Vec<AttachmentValue>,
}

impl AttachmentColumn {
    /// Creates an empty column of `ty`.
    #[must_use]
    pub fn new(ty: &AttachmentType, pass_on: bool) -> Self {
        Self {
            type_name: ty.name().to_owned(),
            pass_on,
            default: ty.default_value().clone(),
            values: Vec::new(),
        }
    }

    /// Grows or shrinks the column to `len` slots, filling with the default.
    pub fn resize(&mut self, len: usize) {
        self.values.resize(len, self.default.clone());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the element created at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AttachmentValue> {
        self.values.get(index)
    }

    /// Like [`get`](Self::get), falling back to the default for slots the
    /// column does not hold.
    #[must_use]
    pub fn get_or_default(&self, index: usize) -> &AttachmentValue {
        self.values.get(index).unwrap_or(&self.default)
    }
}

/// Name → type binding of a declared attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub type_name: String,
    pub pass_on: bool,
}

/// Registered value types and declared attachment names.
#[derive(Debug, Clone)]
pub struct AttachmentRegistry {
    types: HashMap<String, AttachmentType>,
    declared: HashMap<String, Declaration>,
}

impl Default for AttachmentRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for ty in AttachmentType::builtin() {
            registry.register_type(ty);
        }
        registry
    }
}

impl AttachmentRegistry {
    /// Creates a registry that knows the built-in value types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry without any value types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            declared: HashMap::new(),
        }
    }

    /// Registers a value type, replacing one with the same name.
    pub fn register_type(&mut self, ty: AttachmentType) {
        self.types.insert(ty.name().to_owned(), ty);
    }

    #[must_use]
    pub fn type_is_registered(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    #[must_use]
    pub fn value_type(&self, type_name: &str) -> Option<&AttachmentType> {
        self.types.get(type_name)
    }

    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declared.get(name)
    }

    /// Binds `name` to `type_name`.
    ///
    /// The first declaration of a name wins. Declaring it again with the
    /// same type is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::UnregisteredType`] if `type_name` is
    /// unknown and [`AttachmentError::TypeMismatch`] if `name` is already
    /// bound to another type.
    pub fn declare(
        &mut self,
        name: &str,
        type_name: &str,
        pass_on: bool,
    ) -> Result<(), AttachmentError> {
        if let Some(existing) = self.declared.get(name) {
            return check_type(name, existing, type_name);
        }
        if !self.type_is_registered(type_name) {
            return Err(AttachmentError::UnregisteredType(type_name.to_owned()));
        }
        self.declared.insert(
            name.to_owned(),
            Declaration {
                type_name: type_name.to_owned(),
                pass_on,
            },
        );
        Ok(())
    }

    /// Looks up the value type `name` is declared with and checks that it
    /// equals `type_name`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is undeclared, declared with another type, or its
    /// type has been removed from the registry.
    pub fn resolve(&self, name: &str, type_name: &str) -> Result<&AttachmentType, AttachmentError> {
        let declaration = self
            .declared
            .get(name)
            .ok_or_else(|| AttachmentError::Undeclared(name.to_owned()))?;
        check_type(name, declaration, type_name)?;
        self.types
            .get(type_name)
            .ok_or_else(|| AttachmentError::UnregisteredType(type_name.to_owned()))
    }
}

fn check_type(name: &str, declaration: &Declaration, given: &str) -> Result<(), AttachmentError> {
    if declaration.type_name == given {
        Ok(())
    } else {
        Err(AttachmentError::TypeMismatch {
            name: name.to_owned(),
            declared: declaration.type_name.clone(),
            given: given.to_owned(),
        })
    }
}

/// Reads up to `count` values of `ty` from `tokens`.
///
/// Slots without a readable value keep the type's default. Returns the
/// column and the number of values actually read.
pub(crate) fn read_column(
    ty: &AttachmentType,
    tokens: &mut TokenStream<'_>,
    count: usize,
    pass_on: bool,
) -> (AttachmentColumn, usize) {
    let mut column = AttachmentColumn::new(ty, pass_on);
    column.values.reserve(count);
    while column.values.len() < count {
        match ty.read(tokens) {
            Some(v) => column.values.push(v),
            None => break,
        }
    }
    let read = column.values.len();
    column.resize(count);
    (column, read)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let mut reg = AttachmentRegistry::new();
        reg.declare("weight", "double", false).unwrap();
        reg.declare("weight", "double", true).unwrap();
        assert!(!reg.declaration("weight").unwrap().pass_on);

        let err = reg.declare("weight", "int", false).unwrap_err();
        assert!(matches!(err, AttachmentError::TypeMismatch { .. }));
        assert_eq!(reg.declaration("weight").unwrap().type_name, "double");
    }

    #[test]
    fn unregistered_type_cannot_be_declared() {
        let mut reg = AttachmentRegistry::empty();
        assert!(matches!(
            reg.declare("weight", "double", false),
            Err(AttachmentError::UnregisteredType(_))
        ));
        assert!(!reg.is_declared("weight"));
    }

    #[test]
    fn registries_are_independent() {
        let mut a = AttachmentRegistry::new();
        let b = AttachmentRegistry::new();
        a.declare("foo", "int", false).unwrap();
        assert!(a.is_declared("foo"));
        assert!(!b.is_declared("foo"));
    }

    #[test]
    fn resolve_rejects_undeclared_names() {
        let reg = AttachmentRegistry::new();
        assert!(matches!(
            reg.resolve("foo", "int"),
            Err(AttachmentError::Undeclared(_))
        ));
    }

    #[test]
    fn short_column_is_padded_with_defaults() {
        let reg = AttachmentRegistry::new();
        let ty = reg.value_type("int").unwrap();
        let mut tokens = TokenStream::new("4 5");
        let (column, read) = read_column(ty, &mut tokens, 3, false);
        assert_eq!(read, 2);
        assert_eq!(
            column.values,
            vec![
                AttachmentValue::Int(4),
                AttachmentValue::Int(5),
                AttachmentValue::Int(0)
            ]
        );
    }

    #[test]
    fn resized_column_fills_with_type_default() {
        let reg = AttachmentRegistry::new();
        let mut column = AttachmentColumn::new(reg.value_type("double").unwrap(), false);
        column.values.push(AttachmentValue::Double(2.5));
        column.resize(3);
        assert_eq!(column.get(2), Some(&AttachmentValue::Double(0.0)));
        assert_eq!(column.get_or_default(7), &AttachmentValue::Double(0.0));
        column.resize(1);
        assert_eq!(column.values, vec![AttachmentValue::Double(2.5)]);
    }

    #[test]
    fn attachment_node_names_round_trip() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_attachment_node(kind.attachment_node()), Some(kind));
        }
        assert_eq!(ElementKind::from_attachment_node("grid"), None);
    }
}
