use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

use super::model::{Table, PREFERENCE_COLUMNS, RANK};

// ---------------------------------------------------------------------------
// Filter predicate: which preference column(s) and which values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    /// Match against a single named preference column.
    OneColumn(String),
    /// Match against every preference column the table has.
    AllColumns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub mode: FilterMode,
    pub values: BTreeSet<i64>,
}

impl FilterSpec {
    /// Build a spec from the filter controls.
    pub fn from_input(search_all: bool, column: &str, value_text: &str) -> AppResult<Self> {
        let mode = if search_all {
            FilterMode::AllColumns
        } else {
            FilterMode::OneColumn(column.to_string())
        };
        Ok(FilterSpec {
            mode,
            values: parse_values(value_text)?,
        })
    }
}

/// Parse comma-separated integers such as `"11, 12,13"`.
///
/// Empty tokens are skipped; any other token that is not an integer rejects
/// the whole input.
pub fn parse_values(text: &str) -> AppResult<BTreeSet<i64>> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| AppError::InvalidFilterInput(token.to_string()))
        })
        .collect()
}

/// Return the rows of `table` that match `spec`, sorted ascending by rank.
///
/// The sort is stable and rows without a rank go last.
pub fn apply(table: &Table, spec: &FilterSpec) -> AppResult<Table> {
    let rank_idx = table
        .column_index(RANK)
        .ok_or_else(|| AppError::MissingColumn(RANK.to_string()))?;

    let columns: Vec<usize> = match &spec.mode {
        FilterMode::OneColumn(name) => vec![table
            .column_index(name)
            .ok_or_else(|| AppError::MissingColumn(name.clone()))?],
        // Preference columns missing from the table are skipped.
        FilterMode::AllColumns => PREFERENCE_COLUMNS
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect(),
    };

    let mut rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| {
            columns.iter().any(|&i| {
                row[i]
                    .as_integer()
                    .is_some_and(|v| spec.values.contains(&v))
            })
        })
        .cloned()
        .collect();
    rows.sort_by(|a, b| a[rank_idx].rank_cmp(&b[rank_idx]));

    Ok(Table {
        columns: table.columns.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    /// Rank, Applicant Name, p1, p2, p3 with ranks deliberately out of order.
    fn sample() -> Table {
        let row = |rank: i64, name: &str, p: [Option<i64>; 3]| {
            let mut cells = vec![CellValue::Integer(rank), CellValue::Text(name.into())];
            cells.extend(p.iter().map(|v| match v {
                Some(v) => CellValue::Integer(*v),
                None => CellValue::Missing,
            }));
            cells
        };
        Table::new(
            ["Rank", "Applicant Name", "p1", "p2", "p3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![
                row(4, "D", [Some(5), Some(11), Some(12)]),
                row(1, "A", [Some(3), Some(5), Some(11)]),
                row(3, "C", [Some(7), None, Some(12)]),
                row(2, "B", [Some(5), Some(5), Some(5)]),
                row(5, "E", [None, None, Some(9)]),
            ],
        )
    }

    fn names(table: &Table) -> Vec<String> {
        table.rows.iter().map(|r| r[1].to_string()).collect()
    }

    #[test]
    fn parse_values_trims_and_skips_empty_tokens() {
        assert_eq!(
            parse_values("11, 12,13").unwrap(),
            BTreeSet::from([11, 12, 13])
        );
        assert_eq!(parse_values(" 7 ,, ").unwrap(), BTreeSet::from([7]));
        assert!(parse_values("").unwrap().is_empty());
    }

    #[test]
    fn parse_values_rejects_non_integers() {
        match parse_values("11,abc") {
            Err(AppError::InvalidFilterInput(token)) => assert_eq!(token, "abc"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(parse_values("1.5").is_err());
    }

    #[test]
    fn one_column_matches_and_sorts_by_rank() {
        let spec = FilterSpec::from_input(false, "p3", "11,12").unwrap();
        let out = apply(&sample(), &spec).unwrap();
        assert_eq!(names(&out), vec!["A", "C", "D"]);
        assert_eq!(out.columns, sample().columns);
    }

    #[test]
    fn all_columns_is_a_union_without_duplicates() {
        let spec = FilterSpec::from_input(true, "p1", "5").unwrap();
        let out = apply(&sample(), &spec).unwrap();
        // B matches on three columns but appears once.
        assert_eq!(names(&out), vec!["A", "B", "D"]);
    }

    #[test]
    fn all_columns_skips_absent_preferences() {
        // The sample only has p1..p3; p4..p9 are silently ignored.
        let spec = FilterSpec::from_input(true, "p9", "9").unwrap();
        let out = apply(&sample(), &spec).unwrap();
        assert_eq!(names(&out), vec!["E"]);
    }

    #[test]
    fn absent_column_in_one_column_mode_is_an_error() {
        let spec = FilterSpec::from_input(false, "p7", "1").unwrap();
        match apply(&sample(), &spec) {
            Err(AppError::MissingColumn(c)) => assert_eq!(c, "p7"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn integral_floats_match_and_missing_rank_sorts_last() {
        let table = Table::new(
            vec!["Rank".into(), "p1".into()],
            vec![
                vec![CellValue::Missing, CellValue::Float(11.0)],
                vec![CellValue::Integer(8), CellValue::Integer(11)],
            ],
        );
        let spec = FilterSpec::from_input(false, "p1", "11").unwrap();
        let out = apply(&table, &spec).unwrap();
        assert_eq!(out.rows[0][0], CellValue::Integer(8));
        assert_eq!(out.rows[1][0], CellValue::Missing);
    }
}
