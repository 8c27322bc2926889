use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow2::array::Array;
use arrow2::chunk::Chunk;
use arrow2::datatypes::Schema;
use arrow2::io::csv::write as csv_write;
use arrow2::io::parquet::write::{
    transverse, CompressionOptions, Encoding, FileWriter, RowGroupIterator, Version, WriteOptions,
};
use tracing::info;

use crate::arrow_converter::{footprint_schema, to_chunk};
use crate::config::{FootprintConfig, ReportFormat};
use crate::error::{FootprintError, Result};
use crate::records::FootprintRecord;

const WRITE_OPTIONS: WriteOptions = WriteOptions {
    write_statistics: true,
    compression: CompressionOptions::Snappy,
    version: Version::V2,
    data_pagesize_limit: None,
};

/// File name of the report, e.g. `wheat_2019_footprint.parquet`.
pub fn report_file_name(commodity: &str, year: u16, format: ReportFormat) -> String {
    let extension = match format {
        ReportFormat::Parquet => "parquet",
        ReportFormat::Csv => "csv",
    };
    let commodity = commodity
        .trim()
        .to_lowercase()
        .replace(|c: char| c.is_whitespace() || c == '/' || c == '\\', "_");
    format!("{commodity}_{year}_footprint.{extension}")
}

/// Write the output table to the configured directory and return its path.
pub fn write_report(rows: &[FootprintRecord], cfg: &FootprintConfig) -> Result<PathBuf> {
    fs::create_dir_all(&cfg.output.dir).map_err(|source| FootprintError::Io {
        path: cfg.output.dir.clone(),
        source,
    })?;
    let path = cfg
        .output
        .dir
        .join(report_file_name(&cfg.commodity, cfg.year, cfg.output.format));

    let schema = footprint_schema();
    let chunk = to_chunk(rows);
    match cfg.output.format {
        ReportFormat::Parquet => write_parquet(&path, schema, chunk)?,
        ReportFormat::Csv => write_csv(&path, &schema, &chunk)?,
    }

    info!(path = %path.display(), rows = rows.len(), "wrote report");
    Ok(path)
}

pub fn write_parquet(path: &Path, schema: Schema, chunk: Chunk<Box<dyn Array>>) -> Result<()> {
    let write_error = |source: arrow2::error::Error| FootprintError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|source| FootprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let encodings = schema
        .fields
        .iter()
        .map(|f| transverse(&f.data_type, |_| Encoding::Plain))
        .collect();

    // an empty table still gets a file carrying the schema
    let chunks = if chunk.is_empty() { vec![] } else { vec![Ok(chunk)] };
    let row_groups = RowGroupIterator::try_new(chunks.into_iter(), &schema, WRITE_OPTIONS, encodings)
        .map_err(write_error)?;

    let mut writer = FileWriter::try_new(file, schema, WRITE_OPTIONS).map_err(write_error)?;
    for group in row_groups {
        writer.write(group.map_err(write_error)?).map_err(write_error)?;
    }
    writer.end(None).map_err(write_error)?;
    Ok(())
}

pub fn write_csv(path: &Path, schema: &Schema, chunk: &Chunk<Box<dyn Array>>) -> Result<()> {
    let write_error = |source: arrow2::error::Error| FootprintError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(|source| FootprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let options = csv_write::SerializeOptions::default();
    let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    csv_write::write_header(&mut file, &names, &options).map_err(write_error)?;
    csv_write::write_chunk(&mut file, chunk, &options).map_err(write_error)?;
    Ok(())
}
