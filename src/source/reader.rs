//! Reading legacy exports from disk.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`) are read with `calamine`,
//! plain exports (`.csv`) with the `csv` crate. In both cases the first row is
//! the header and only the first worksheet is used.

use super::{CellValue, Row};
use crate::errors::{Error, Result};
use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, error, info};

/// Reads every record of the export at `path`.
///
/// Wholly blank rows are skipped.
///
/// # Errors
/// Returns an error if the file is missing, has an unsupported extension, or
/// cannot be parsed.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        other => {
            return Err(Error::Spreadsheet {
                message: format!(
                    "Unsupported source format `{other}` for {}",
                    path.display()
                ),
            });
        }
    };

    Ok(rows.into_iter().filter(|row| !row.is_blank()).collect())
}

/// Reads the export at `path`, returning an empty sequence on any failure.
///
/// Failures are logged, never raised: a missing export simply means nothing
/// of that kind gets migrated.
#[must_use]
pub fn load_rows(path: &Path) -> Vec<Row> {
    debug!("Reading file: {}", path.display());
    match read_rows(path) {
        Ok(rows) => {
            info!("Read {} records from {}", rows.len(), path.display());
            if let Some(first) = rows.first() {
                debug!(
                    "Columns found: {}",
                    first.columns().collect::<Vec<_>>().join(", ")
                );
            }
            rows
        }
        Err(e) => {
            error!("Failed to read file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_workbook(path: &Path) -> Result<Vec<Row>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Spreadsheet {
        message: format!("Failed to open workbook {}: {e}", path.display()),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Spreadsheet {
            message: format!("Workbook {} has no worksheets", path.display()),
        })?
        .map_err(|e| Error::Spreadsheet {
            message: format!("Failed to read first worksheet of {}: {e}", path.display()),
        })?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(ToString::to_string).collect();

    let rows = sheet_rows
        .map(|cells| {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells) {
                if !header.trim().is_empty() {
                    row.insert(header, cell_from_data(cell));
                }
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Converts a workbook cell into a [`CellValue`].
///
/// Error cells (`#N/A`, `#DIV/0!`, ...) are treated as blank.
pub(crate) fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Bool(value) => CellValue::Bool(*value),
        Data::Int(value) => CellValue::Int(*value),
        Data::Float(value) => CellValue::Float(*value),
        Data::String(value) => CellValue::Text(value.clone()),
        Data::DateTime(value) => value
            .as_datetime()
            .map_or(CellValue::Float(value.as_f64()), CellValue::DateTime),
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.trim().is_empty() {
                continue;
            }
            let cell = if value.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(value.to_string())
            };
            row.insert(header, cell);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "pacientes.csv",
            "id,Nombre,Apellidos,email\n10,Ana,Garcia,\n11,Luis,Perez,luis@example.com\n,,,\n",
        );

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&CellValue::from("10")));
        assert_eq!(rows[0].get("nombre"), Some(&CellValue::from("Ana")));
        assert!(rows[0].get("email").is_none());
        assert_eq!(
            rows[1].get("email"),
            Some(&CellValue::from("luis@example.com"))
        );
    }

    #[test]
    fn test_load_rows_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rows = load_rows(&dir.path().join("absent.xlsx"));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_load_rows_unsupported_extension_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", "id\n1\n");
        assert!(read_rows(&path).is_err());
        assert!(load_rows(&path).is_empty());
    }

    #[test]
    fn test_load_rows_corrupt_workbook_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.xlsx", "this is not a zip archive");
        assert!(load_rows(&path).is_empty());
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::Int(3)), CellValue::Int(3));
        assert_eq!(cell_from_data(&Data::Float(2.5)), CellValue::Float(2.5));
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(
            cell_from_data(&Data::String("Ana".to_string())),
            CellValue::from("Ana")
        );
        assert_eq!(
            cell_from_data(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Empty
        );
    }
}
