use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{open_workbook, Data, Reader, Xlsx};

use super::document;
use super::model::{CellValue, Table, NUMERIC_COLUMNS};

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// Everything the loader can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.csv`
    DelimitedText,
    /// `.xlsx`, first worksheet
    Spreadsheet,
    /// `.pdf`, tables extracted from every page
    DocumentTable,
}

impl SourceFormat {
    /// Pick the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension(path).as_str() {
            "csv" => Some(SourceFormat::DelimitedText),
            "xlsx" => Some(SourceFormat::Spreadsheet),
            "pdf" => Some(SourceFormat::DocumentTable),
            _ => None,
        }
    }

    /// Read `path` into a table.
    pub fn read(self, path: &Path) -> Result<Table> {
        match self {
            SourceFormat::DelimitedText => load_csv(path),
            SourceFormat::Spreadsheet => load_xlsx(path),
            SourceFormat::DocumentTable => load_pdf(path),
        }
    }

    /// Extensions offered in the open dialog.
    pub const EXTENSIONS: [&'static str; 3] = ["xlsx", "csv", "pdf"];
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, every other row is data.
/// Cells are typed one by one: blank, integer, float, then text.
///
/// Short rows are padded with missing cells; a row wider than the header is
/// an error.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        if record.len() > columns.len() {
            bail!(
                "CSV row {} has {} fields but the header has {}",
                row_no + 1,
                record.len(),
                columns.len()
            );
        }
        rows.push(record.iter().map(CellValue::infer).collect());
    }

    Ok(Table::new(columns, rows))
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

fn load_xlsx(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path).context("opening Excel workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheet")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        bail!("worksheet is empty");
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell_value(cell) {
            CellValue::Missing => format!("Unnamed: {i}"),
            value => value.to_string(),
        })
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(Table::new(columns, rows))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => {
            let value = CellValue::Float(*f);
            match value.as_integer() {
                Some(i) => CellValue::Integer(i),
                None => value,
            }
        }
        Data::String(s) if s.trim().is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// PDF loader
// ---------------------------------------------------------------------------

fn load_pdf(path: &Path) -> Result<Table> {
    let rows = document::extract_rows(path)?;
    table_from_document_rows(rows)
}

/// First row is the header; known numeric columns are coerced to integers.
///
/// Repeated header rows (one per page in many exports) are dropped.
pub(crate) fn table_from_document_rows(rows: Vec<Vec<Option<String>>>) -> Result<Table> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        bail!("no table found in document");
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, name)| match name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Unnamed: {i}"),
        })
        .collect();
    let numeric: Vec<bool> = columns
        .iter()
        .map(|c| NUMERIC_COLUMNS.contains(&c.as_str()))
        .collect();

    let mut data = Vec::new();
    for (row_no, row) in rows.enumerate() {
        if row == header {
            continue;
        }
        if row.len() > columns.len() {
            bail!(
                "table row {} has {} cells but the header has {}",
                row_no + 1,
                row.len(),
                columns.len()
            );
        }
        let cells = row
            .iter()
            .zip(&numeric)
            .map(|(cell, &is_numeric)| match cell.as_deref() {
                None => CellValue::Missing,
                Some(text) if is_numeric => CellValue::coerce_integer(text),
                Some(text) if text.trim().is_empty() => CellValue::Missing,
                Some(text) => CellValue::Text(text.to_string()),
            })
            .collect();
        data.push(cells);
    }

    Ok(Table::new(columns, data))
}
