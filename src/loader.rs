use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow2::array::*;
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field};
use arrow2::io::csv::read;
use tracing::debug;

use crate::error::{FootprintError, Result};

const READ_BATCH_ROWS: usize = 1024;

/// An in-memory CSV table with inferred column types.
///
/// The table keeps the path it was read from so that column lookups further
/// down the pipeline can name the offending file.
pub struct Table {
    source: PathBuf,
    fields: Vec<Field>,
    columns: Chunk<Box<dyn Array>>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("source", &self.source)
            .field("columns", &self.column_names())
            .field("rows", &self.len())
            .finish()
    }
}

/// Read a CSV file with a header row into a [`Table`].
///
/// Column types are inferred over the whole file: integer, float and text
/// cells come back as `Int64`, `Float64` and `Utf8` arrays, empty cells as
/// nulls.
pub fn load_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|source| FootprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source: arrow2::error::Error| FootprintError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = read::ReaderBuilder::new().from_reader(file);
    let (fields, _) = read::infer_schema(&mut reader, None, true, &read::infer).map_err(csv_error)?;

    let mut rows = Vec::new();
    loop {
        let mut batch = vec![read::ByteRecord::default(); READ_BATCH_ROWS];
        let read_rows = read::read_rows(&mut reader, 0, &mut batch).map_err(csv_error)?;
        batch.truncate(read_rows);
        rows.extend(batch);
        if read_rows < READ_BATCH_ROWS {
            break;
        }
    }

    // deserialize_batch yields a chunk without columns for zero rows
    let columns = if rows.is_empty() {
        Chunk::new(
            fields
                .iter()
                .map(|field| new_empty_array(field.data_type.clone()))
                .collect(),
        )
    } else {
        read::deserialize_batch(&rows, &fields, None, 0, read::deserialize_column)
            .map_err(csv_error)?
    };

    debug!(
        path = %path.display(),
        rows = columns.len(),
        columns = fields.len(),
        "loaded table"
    );

    Ok(Table::new(path, fields, columns))
}

impl Table {
    pub fn new(source: impl Into<PathBuf>, fields: Vec<Field>, columns: Chunk<Box<dyn Array>>) -> Self {
        Self {
            source: source.into(),
            fields,
            columns,
        }
    }

    /// Build a table from named arrays of equal length.
    pub fn from_arrays(source: impl Into<PathBuf>, arrays: Vec<(&str, Box<dyn Array>)>) -> Self {
        let (fields, arrays): (Vec<_>, Vec<_>) = arrays
            .into_iter()
            .map(|(name, array)| (Field::new(name, array.data_type().clone(), true), array))
            .unzip();
        Self::new(source, fields, Chunk::new(arrays))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| FootprintError::MissingColumn {
                path: self.source.clone(),
                column: name.to_string(),
            })
    }

    pub fn column(&self, name: &str) -> Result<&dyn Array> {
        let index = self.index_of(name)?;
        Ok(self.columns.arrays()[index].as_ref())
    }

    pub fn into_parts(self) -> (PathBuf, Vec<Field>, Chunk<Box<dyn Array>>) {
        (self.source, self.fields, self.columns)
    }

    /// Column values rendered as text. Integral floats lose their fraction,
    /// so a code read as `4.0` comes back as `"4"`.
    pub fn strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let array = self.column(name)?;
        match array.data_type() {
            DataType::Utf8 => Ok(downcast::<Utf8Array<i32>>(array)
                .iter()
                .map(|v| v.map(str::to_string))
                .collect()),
            DataType::LargeUtf8 => Ok(downcast::<Utf8Array<i64>>(array)
                .iter()
                .map(|v| v.map(str::to_string))
                .collect()),
            DataType::Int64 => Ok(downcast::<PrimitiveArray<i64>>(array)
                .iter()
                .map(|v| v.map(|v| v.to_string()))
                .collect()),
            DataType::Float64 => Ok(downcast::<PrimitiveArray<f64>>(array)
                .iter()
                .map(|v| v.map(|v| render_float(*v)))
                .collect()),
            DataType::Null => Ok(vec![None; array.len()]),
            other => Err(self.unsupported(name, other)),
        }
    }

    /// Column values as `f64`. Text cells are parsed; blank text is null.
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let array = self.column(name)?;
        match array.data_type() {
            DataType::Float64 => Ok(downcast::<PrimitiveArray<f64>>(array)
                .iter()
                .map(|v| v.copied())
                .collect()),
            DataType::Int64 => Ok(downcast::<PrimitiveArray<i64>>(array)
                .iter()
                .map(|v| v.map(|v| *v as f64))
                .collect()),
            DataType::Utf8 => downcast::<Utf8Array<i32>>(array)
                .iter()
                .enumerate()
                .map(|(row, v)| self.parse_number(name, row, v))
                .collect(),
            DataType::LargeUtf8 => downcast::<Utf8Array<i64>>(array)
                .iter()
                .enumerate()
                .map(|(row, v)| self.parse_number(name, row, v))
                .collect(),
            DataType::Null => Ok(vec![None; array.len()]),
            other => Err(self.unsupported(name, other)),
        }
    }

    fn parse_number(&self, column: &str, row: usize, value: Option<&str>) -> Result<Option<f64>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => text
                .parse::<f64>()
                .map(Some)
                .map_err(|_| FootprintError::InvalidValue {
                    path: self.source.clone(),
                    column: column.to_string(),
                    row: row + 1,
                    value: text.to_string(),
                }),
        }
    }

    fn unsupported(&self, column: &str, data_type: &DataType) -> FootprintError {
        FootprintError::UnsupportedType {
            path: self.source.clone(),
            column: column.to_string(),
            data_type: format!("{data_type:?}"),
        }
    }
}

fn downcast<A: 'static>(array: &dyn Array) -> &A {
    // callers match on the data type first, which fixes the concrete array
    array
        .as_any()
        .downcast_ref::<A>()
        .unwrap_or_else(|| unreachable!("array type does not match its data type"))
}

fn render_float(value: f64) -> String {
    let in_i64_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    if in_i64_range && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
