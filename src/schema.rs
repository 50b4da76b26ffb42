//! Declarative entity schemas and header-to-field column mapping.
//!
//! Each entity kind declares a static slice of [`FieldDescriptor`]s naming the
//! record field, the column title it is read from, its [`SemanticType`], and a
//! getter/setter pair. Fields with an empty tag are assigned by the loader and
//! never read from input.
//!
//! [`ColumnIndex::build`] resolves the descriptors against one header row. The
//! resulting table is reused for every data row of that file.

use std::{collections::BTreeMap, fmt};

use crate::{data::FieldValue, error::LoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Integer,
    Float,
    Boolean,
    Text,
    Reference,
}

impl SemanticType {
    pub fn describe(&self) -> &'static str {
        match self {
            SemanticType::Integer => "integer",
            SemanticType::Float => "float32",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "text",
            SemanticType::Reference => "identifier reference",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

pub struct FieldDescriptor<R> {
    pub name: &'static str,
    pub tag: &'static str,
    pub semantic_type: SemanticType,
    pub get: fn(&R) -> FieldValue,
    /// Returns `false` when the value variant does not match the field.
    pub set: fn(&mut R, FieldValue) -> bool,
}

impl<R> FieldDescriptor<R> {
    pub fn is_mapped(&self) -> bool {
        !self.tag.is_empty()
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("semantic_type", &self.semantic_type)
            .finish()
    }
}

/// Declares a [`FieldDescriptor`] for `$record.$field`, whose Rust type must
/// be the payload of the `FieldValue::$kind` variant.
macro_rules! field {
    ($record:ty, $field:ident, $tag:literal, $kind:ident) => {
        $crate::schema::FieldDescriptor::<$record> {
            name: stringify!($field),
            tag: $tag,
            semantic_type: $crate::schema::SemanticType::$kind,
            get: |record: &$record| $crate::data::FieldValue::$kind(record.$field.clone()),
            set: |record: &mut $record, value: $crate::data::FieldValue| match value {
                $crate::data::FieldValue::$kind(inner) => {
                    record.$field = inner;
                    true
                }
                _ => false,
            },
        }
    };
}
pub(crate) use field;

#[derive(Debug)]
pub struct EntitySchema<R: 'static> {
    pub entity: &'static str,
    pub fields: &'static [FieldDescriptor<R>],
}

impl<R: 'static> EntitySchema<R> {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldDescriptor<R>> {
        self.fields.iter().filter(|field| field.is_mapped())
    }

    /// Reads every mapped field of `record` in declaration order.
    pub fn mapped_values(&self, record: &R) -> Vec<(&'static str, FieldValue)> {
        self.mapped_fields()
            .map(|field| (field.name, (field.get)(record)))
            .collect()
    }
}

/// Position of the first header title exactly equal to `title`.
pub fn column_position<S: AsRef<str>>(header: &[S], title: &str) -> Option<usize> {
    header.iter().position(|candidate| candidate.as_ref() == title)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    entries: Vec<(&'static str, usize)>,
    missing: Vec<(&'static str, &'static str)>,
}

impl ColumnIndex {
    pub fn build<S: AsRef<str>, R: 'static>(header: &[S], schema: &EntitySchema<R>) -> Self {
        let mut index = ColumnIndex::default();
        for field in schema.mapped_fields() {
            match column_position(header, field.tag) {
                Some(column) => index.entries.push((field.name, column)),
                None => index.missing.push((field.name, field.tag)),
            }
        }
        index
    }

    pub fn get(&self, field: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
    }

    /// Mapped fields with their column, in schema declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tagged fields without a matching header title.
    pub fn mismatches(&self) -> Vec<LoadError> {
        self.missing
            .iter()
            .map(|&(field, tag)| LoadError::SchemaMismatch { field, tag })
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, usize> {
        self.entries.iter().copied().collect()
    }
}
