use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const RANK: &str = "Rank";
pub const APPLICANT_NAME: &str = "Applicant Name";
pub const GENDER: &str = "Gender";
pub const DISTRICT: &str = "District";

/// The nine preference columns, in display order.
pub const PREFERENCE_COLUMNS: [&str; 9] = ["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9"];

/// Columns coerced to integers when a table comes out of a PDF document.
pub const NUMERIC_COLUMNS: [&str; 10] = [RANK, "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9"];

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, close to what a spreadsheet column holds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Infer a value from raw text: blank → missing, then integer, float, text.
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return CellValue::Missing;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
        CellValue::Text(raw.to_string())
    }

    /// Parse text as an integer, treating anything unparseable as missing.
    pub fn coerce_integer(raw: &str) -> Self {
        match CellValue::infer(raw).as_integer() {
            Some(i) => CellValue::Integer(i),
            None => CellValue::Missing,
        }
    }

    /// Integral view of the value; `11.0` counts as `11`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Ordering used for sorting by rank: numbers first, then text, then missing.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        fn class(v: &CellValue) -> u8 {
            match v {
                CellValue::Integer(_) | CellValue::Float(_) => 0,
                CellValue::Text(_) => 1,
                CellValue::Missing => 2,
            }
        }
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (a, b) if class(a) == 0 && class(b) == 0 => {
                a.as_f64().unwrap_or(0.0).total_cmp(&b.as_f64().unwrap_or(0.0))
            }
            (a, b) => class(a).cmp(&class(b)),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the loaded dataset
// ---------------------------------------------------------------------------

/// An ordered set of named columns and rows of cells.
///
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table, padding short rows with missing cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Missing);
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_covers_each_kind() {
        assert_eq!(CellValue::infer(""), CellValue::Missing);
        assert_eq!(CellValue::infer("  "), CellValue::Missing);
        assert_eq!(CellValue::infer("12"), CellValue::Integer(12));
        assert_eq!(CellValue::infer("1.5"), CellValue::Float(1.5));
        assert_eq!(CellValue::infer("Kathmandu"), CellValue::Text("Kathmandu".into()));
    }

    #[test]
    fn coerce_integer_drops_garbage() {
        assert_eq!(CellValue::coerce_integer(" 7 "), CellValue::Integer(7));
        assert_eq!(CellValue::coerce_integer("7.0"), CellValue::Integer(7));
        assert_eq!(CellValue::coerce_integer("n/a"), CellValue::Missing);
        assert_eq!(CellValue::coerce_integer("7.5"), CellValue::Missing);
    }

    #[test]
    fn rank_order_puts_missing_last() {
        let mut values = vec![
            CellValue::Missing,
            CellValue::Integer(3),
            CellValue::Float(1.5),
            CellValue::Text("x".into()),
            CellValue::Integer(1),
        ];
        values.sort_by(|a, b| a.rank_cmp(b));
        assert_eq!(
            values,
            vec![
                CellValue::Integer(1),
                CellValue::Float(1.5),
                CellValue::Integer(3),
                CellValue::Text("x".into()),
                CellValue::Missing,
            ]
        );
    }

    #[test]
    fn new_pads_short_rows() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Integer(1)]],
        );
        assert_eq!(table.rows[0], vec![CellValue::Integer(1), CellValue::Missing]);
        assert_eq!(table.column_index("b"), Some(1));
        assert_eq!(table.column_index("c"), None);
    }
}
