/// Comma-separated numeric tables.
///
/// Rows are records and columns are fields. There is no header; blank
/// lines and lines starting with `#` are skipped. Used for contour tables,
/// rainfall distributions and tailwater series.

use std::fs::{self, File};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::model::{DataError, DataResult};

/// Parses table text. Line numbers in errors are 1-based.
pub fn parse_table(text: &str) -> DataResult<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataError::Parse {
            line: e.position().map_or(0, |p| p.line() as usize),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let row = record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|_| DataError::Parse {
                    line,
                    message: format!("'{}' is not a number", field),
                })
            })
            .collect::<DataResult<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a table from disk. Fails if the file does not exist.
pub fn read_table(path: impl AsRef<Path>) -> DataResult<Vec<Vec<f64>>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DataError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&text)
}

/// First two columns of a table as `(x, y)` pairs.
pub fn read_pairs(path: impl AsRef<Path>) -> DataResult<Vec<(f64, f64)>> {
    pairs(read_table(path)?)
}

fn pairs(rows: Vec<Vec<f64>>) -> DataResult<Vec<(f64, f64)>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row.as_slice() {
            [x, y, ..] => Ok((*x, *y)),
            _ => Err(DataError::Parse {
                line: i + 1,
                message: format!("expected two columns, found {}", row.len()),
            }),
        })
        .collect()
}

/// Writes rows as comma-separated lines, replacing any existing file.
pub fn write_table(path: impl AsRef<Path>, rows: &[Vec<f64>]) -> DataResult<()> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| DataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(file);
    for row in rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| io_error(e.into()))?;
    }
    writer.flush().map_err(io_error)
}
