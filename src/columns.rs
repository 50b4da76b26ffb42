//! Field-to-column listing for an input file.
//!
//! Resolves the school and result schemas against the file's header and
//! renders every declared field with the column it maps to, so a new data
//! release can be checked before it is loaded.

use anyhow::Result;
use log::info;

use crate::{
    cli::ColumnsArgs,
    io_utils,
    models::{RESULT_SCHEMA, SCHOOL_SCHEMA},
    schema::{ColumnIndex, EntitySchema},
    table::{self, Column},
};

pub fn describe<R: 'static>(header: &[String], schema: &EntitySchema<R>) -> Vec<Vec<String>> {
    let index = ColumnIndex::build(header, schema);
    schema
        .fields
        .iter()
        .map(|field| {
            let column = if !field.is_mapped() {
                "(derived)".to_string()
            } else {
                match index.get(field.name) {
                    Some(position) => (position + 1).to_string(),
                    None => "-".to_string(),
                }
            };
            vec![
                schema.entity.to_string(),
                field.name.to_string(),
                field.tag.to_string(),
                field.semantic_type.to_string(),
                column,
            ]
        })
        .collect()
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let header = reader.byte_headers()?.clone();
    let header = io_utils::decode_record(&header, encoding)?;

    let mut rows = describe(&header, &SCHOOL_SCHEMA);
    rows.extend(describe(&header, &RESULT_SCHEMA));
    let columns = [
        Column::left("entity"),
        Column::left("field"),
        Column::left("tag"),
        Column::left("type"),
        Column::right("column"),
    ];
    table::print_table(&columns, &rows);

    let unmatched = rows.iter().filter(|row| row[4] == "-").count();
    info!(
        "{} header column(s); {} tagged field(s) without a matching column",
        header.len(),
        unmatched
    );
    Ok(())
}
