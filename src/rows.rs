//! Row population: turns one raw data row into a typed record.
//!
//! [`populate()`] walks the schema in declaration order, reads the mapped cell
//! for each field, strips sentinel tokens, and coerces the remainder through
//! [`coerce_cell()`]. The first failing field aborts the row.

use log::debug;

use crate::{
    data::{CoerceFailure, coerce_cell, strip_sentinels},
    error::LoadError,
    schema::{ColumnIndex, EntitySchema},
};

pub fn populate<S, R>(row: &[S], index: &ColumnIndex, schema: &EntitySchema<R>) -> Result<R, LoadError>
where
    S: AsRef<str>,
    R: Default + 'static,
{
    let mut record = R::default();
    for field in schema.mapped_fields() {
        let Some(column) = index.get(field.name) else {
            continue;
        };
        let raw = row.get(column).map(|cell| cell.as_ref()).unwrap_or("");
        let cleaned = strip_sentinels(raw);
        debug!("{}.{}: {raw:?} -> {cleaned:?}", schema.entity, field.name);
        let value = coerce_cell(&cleaned, field.semantic_type).map_err(|failure| match failure {
            CoerceFailure::InvalidNumber => LoadError::InvalidNumber {
                field: field.name,
                tag: field.tag,
                value: raw.to_string(),
                expected: field.semantic_type,
            },
            CoerceFailure::UnsupportedType => LoadError::UnsupportedType {
                field: field.name,
                semantic_type: field.semantic_type,
            },
        })?;
        if !(field.set)(&mut record, value) {
            return Err(LoadError::UnsupportedType {
                field: field.name,
                semantic_type: field.semantic_type,
            });
        }
    }
    Ok(record)
}
