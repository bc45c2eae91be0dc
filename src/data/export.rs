use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use super::loader::extension;
use super::model::{CellValue, Table};

/// Name of the generated sequence column placed first in every export.
pub const SERIAL_COLUMN: &str = "S.N";

/// Everything the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.csv`
    DelimitedText,
    /// `.xlsx`, the default
    Spreadsheet,
}

impl ExportFormat {
    /// Resolve the destination: a path without an extension gets `.xlsx`.
    /// Returns `None` for any other extension.
    pub fn resolve(path: &Path) -> Option<(Self, PathBuf)> {
        match extension(path).as_str() {
            "" => Some((ExportFormat::Spreadsheet, path.with_extension("xlsx"))),
            "xlsx" => Some((ExportFormat::Spreadsheet, path.to_path_buf())),
            "csv" => Some((ExportFormat::DelimitedText, path.to_path_buf())),
            _ => None,
        }
    }

    /// Write `table` with a fresh 1-based `S.N` column in front.
    pub fn write(self, table: &Table, path: &Path) -> Result<()> {
        match self {
            ExportFormat::DelimitedText => write_csv(table, path),
            ExportFormat::Spreadsheet => write_xlsx(table, path),
        }
    }
}

fn header(table: &Table) -> Vec<&str> {
    std::iter::once(SERIAL_COLUMN)
        .chain(table.columns.iter().map(String::as_str))
        .collect()
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(header(table)).context("writing CSV header")?;

    for (i, row) in table.rows.iter().enumerate() {
        let record = std::iter::once((i + 1).to_string()).chain(row.iter().map(|c| c.to_string()));
        writer
            .write_record(record)
            .with_context(|| format!("writing CSV row {}", i + 1))?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in header(table).into_iter().enumerate() {
        sheet
            .write_string(0, column(col)?, name)
            .context("writing header")?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(i + 1).context("too many rows for a worksheet")?;
        sheet
            .write_number(r, 0, (i + 1) as f64)
            .with_context(|| format!("writing row {r}"))?;
        for (j, cell) in row.iter().enumerate() {
            let c = column(j + 1)?;
            let written = match cell {
                CellValue::Integer(v) => sheet.write_number(r, c, *v as f64),
                CellValue::Float(v) => sheet.write_number(r, c, *v),
                CellValue::Text(s) => sheet.write_string(r, c, s),
                CellValue::Missing => continue,
            };
            written.with_context(|| format!("writing row {r}, column {c}"))?;
        }
    }

    workbook.save(path).context("saving workbook")?;
    Ok(())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).context("too many columns for a worksheet")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::SourceFormat;

    fn filtered() -> Table {
        // Already in filtered order; Rank 3 before Rank 1 must survive.
        Table::new(
            vec!["Rank".into(), "Applicant Name".into(), "p1".into()],
            vec![
                vec![
                    CellValue::Integer(3),
                    CellValue::Text("Gita".into()),
                    CellValue::Integer(11),
                ],
                vec![
                    CellValue::Integer(1),
                    CellValue::Text("Hari, Jr".into()),
                    CellValue::Missing,
                ],
            ],
        )
    }

    #[test]
    fn resolve_defaults_to_spreadsheet() {
        let (format, path) = ExportFormat::resolve(Path::new("out")).unwrap();
        assert_eq!(format, ExportFormat::Spreadsheet);
        assert_eq!(path, PathBuf::from("out.xlsx"));
        assert_eq!(
            ExportFormat::resolve(Path::new("out.CSV")).map(|(f, _)| f),
            Some(ExportFormat::DelimitedText)
        );
        assert!(ExportFormat::resolve(Path::new("out.txt")).is_none());
    }

    #[test]
    fn csv_export_prepends_serial_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        ExportFormat::DelimitedText.write(&filtered(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "S.N,Rank,Applicant Name,p1");
        assert_eq!(lines[1], "1,3,Gita,11");
        assert_eq!(lines[2], "2,1,\"Hari, Jr\",");
    }

    #[test]
    fn csv_round_trip_reproduces_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = filtered();
        ExportFormat::DelimitedText.write(&table, &path).unwrap();

        let loaded = SourceFormat::DelimitedText.read(&path).unwrap();
        assert_eq!(loaded.columns[1..], table.columns[..]);
        let serials: Vec<_> = loaded.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(serials, vec![CellValue::Integer(1), CellValue::Integer(2)]);
        let data: Vec<Vec<CellValue>> = loaded.rows.iter().map(|r| r[1..].to_vec()).collect();
        assert_eq!(data, table.rows);
    }

    #[test]
    fn xlsx_round_trip_reproduces_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = filtered();
        ExportFormat::Spreadsheet.write(&table, &path).unwrap();

        let loaded = SourceFormat::Spreadsheet.read(&path).unwrap();
        assert_eq!(loaded.columns[0], SERIAL_COLUMN);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.rows[0][0], CellValue::Integer(1));
        let data: Vec<Vec<CellValue>> = loaded.rows.iter().map(|r| r[1..].to_vec()).collect();
        assert_eq!(data, table.rows);
    }

    #[test]
    fn unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(ExportFormat::DelimitedText.write(&filtered(), &path).is_err());
    }
}
