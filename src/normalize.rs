use arrow2::array::*;
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field};

use crate::error::Result;
use crate::loader::Table;

/// Canonical name of the join key once a table has been normalized.
pub const COUNTRY_CODE: &str = "country_code";

pub const COUNTRY_CODE_WIDTH: usize = 3;

/// Left-pad a code with `'0'` to three characters. Longer codes pass through.
pub fn pad_country_code(code: &str) -> String {
    format!("{code:0>width$}", width = COUNTRY_CODE_WIDTH)
}

/// Rename `raw_column` to `country_code` and zero-pad its values.
///
/// Integer codes are rendered as text first, so a code inferred as `4`
/// becomes `"004"`. Nulls stay null. The column keeps its position.
pub fn normalize_country_code(table: Table, raw_column: &str) -> Result<Table> {
    let index = table.index_of(raw_column)?;
    let codes = table.strings(raw_column)?;

    let mut padded = MutableUtf8Array::<i32>::with_capacity(codes.len());
    for code in &codes {
        padded.push(code.as_deref().map(pad_country_code));
    }
    let padded: Utf8Array<i32> = padded.into();

    let (source, mut fields, columns) = table.into_parts();
    let mut arrays = columns.into_arrays();
    arrays[index] = padded.boxed();
    fields[index] = Field::new(COUNTRY_CODE, DataType::Utf8, true);

    Ok(Table::new(source, fields, Chunk::new(arrays)))
}
