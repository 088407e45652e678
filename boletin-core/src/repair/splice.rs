use crate::error::{CleanError, CleanResult};
use crate::table::{RowKey, WorkRow, WorkTable};

/// How the values after the first one find their row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceMode {
    /// Every extra value gets a synthetic row right after the source row.
    Insert,
    /// An extra value first lands in the k-th following original row when that
    /// row's cell is missing; otherwise it gets a synthetic row.
    FillBelow,
}

/// Unpack a stacked cell holding `values` across rows.
///
/// The first value replaces the source cell. Synthetic rows are keyed after the
/// source row, so rows already in the table keep their positions until
/// [`finish_splices`] re-sequences. A synthetic slot already created by an
/// earlier splice of another column is merged into, not duplicated.
///
/// Returns the number of synthetic rows created.
pub fn splice(
    table: &mut WorkTable,
    origin: RowKey,
    col: usize,
    values: &[String],
    mode: SpliceMode,
) -> CleanResult<usize> {
    check_column(table, col)?;
    let mut created = 0;
    for (offset, value) in values.iter().enumerate() {
        let target = if offset == 0 {
            origin
        } else {
            let below = RowKey::original(origin.base + offset);
            let below_is_free = mode == SpliceMode::FillBelow
                && !origin.is_synthetic()
                && table
                    .position_of(below)
                    .is_some_and(|pos| table.cell(pos, col).is_none());
            if below_is_free {
                below
            } else {
                origin.after(offset)
            }
        };
        if target.is_synthetic() && table.position_of(target).is_none() {
            created += 1;
        }
        table.row_mut_or_insert(target).cells[col] = Some(value.clone());
    }
    Ok(created)
}

/// Re-sequence after all splices of a table and drop rows left entirely blank.
pub fn finish_splices(table: &mut WorkTable) -> usize {
    table.resequence();
    table.drop_blank_rows()
}

/// Spread a stacked cell of N values down the rows starting at `start`.
///
/// Rows for which `advance` holds take the next value; other rows repeat the
/// last value written. Stops once every value has been consumed.
pub fn distribute_down<F>(
    table: &mut WorkTable,
    start: usize,
    col: usize,
    values: &[String],
    advance: F,
) -> CleanResult<usize>
where
    F: Fn(&WorkRow) -> bool,
{
    check_column(table, col)?;
    if values.is_empty() {
        return Ok(0);
    }
    let mut next = 0;
    let mut last: Option<&String> = None;
    let mut touched = 0;
    for row in table.rows_mut().iter_mut().skip(start) {
        if next >= values.len() {
            break;
        }
        let value = if advance(&*row) {
            next += 1;
            &values[next - 1]
        } else {
            last.unwrap_or(&values[0])
        };
        row.cells[col] = Some(value.clone());
        last = Some(value);
        touched += 1;
    }
    Ok(touched)
}

/// Split a stacked cell on its line breaks, dropping blank pieces.
pub fn stacked_values(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

fn check_column(table: &WorkTable, col: usize) -> CleanResult<()> {
    if col >= table.width() {
        return Err(CleanError::RangeOutOfBounds {
            start: col,
            end: col + 1,
            width: table.width(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn column(t: &WorkTable, col: usize) -> Vec<Option<String>> {
        t.rows().iter().map(|r| r.get(col).map(String::from)).collect()
    }

    #[test]
    fn insert_keeps_original_order_and_places_synthetic_rows_after_source() {
        let mut t = table(
            &["Emisor", "Vencimiento"],
            &[
                &[Some("A"), Some("2026")],
                &[Some("B"), Some("2027\n2028\n2029")],
                &[Some("C"), Some("2030")],
            ],
        );
        let created = splice(
            &mut t,
            RowKey::original(1),
            1,
            &strings(&["2027", "2028", "2029"]),
            SpliceMode::Insert,
        )
        .unwrap();
        assert_eq!(created, 2);
        finish_splices(&mut t);

        assert_eq!(
            column(&t, 0),
            vec![some("A"), some("B"), None, None, some("C")]
        );
        assert_eq!(
            column(&t, 1),
            ["2026", "2027", "2028", "2029", "2030"].map(|v| Some(v.to_string()))
        );
        let keys: Vec<_> = t.rows().iter().map(|r| r.key.base).collect();
        assert_eq!(keys, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn fill_below_uses_missing_cells_of_following_rows_first() {
        let mut t = table(
            &["Emisor", "Vencimiento"],
            &[
                &[Some("A"), Some("2027\n2028\n2029")],
                &[Some("B"), None],
                &[Some("C"), Some("2031")],
            ],
        );
        let created = splice(
            &mut t,
            RowKey::original(0),
            1,
            &strings(&["2027", "2028", "2029"]),
            SpliceMode::FillBelow,
        )
        .unwrap();
        assert_eq!(created, 1);
        finish_splices(&mut t);
        assert_eq!(
            column(&t, 1),
            ["2027", "2029", "2028", "2031"].map(|v| Some(v.to_string()))
        );
        assert_eq!(t.cell(1, 0), None);
        assert_eq!(t.cell(2, 0), Some("B"));
    }

    #[test]
    fn second_column_splice_merges_into_existing_synthetic_row() {
        let mut t = table(&["A", "B"], &[&[Some("a1\na2"), Some("b1\nb2")]]);
        splice(&mut t, RowKey::original(0), 0, &strings(&["a1", "a2"]), SpliceMode::Insert).unwrap();
        let created =
            splice(&mut t, RowKey::original(0), 1, &strings(&["b1", "b2"]), SpliceMode::Insert).unwrap();
        assert_eq!(created, 0);
        finish_splices(&mut t);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(1, 0), Some("a2"));
        assert_eq!(t.cell(1, 1), Some("b2"));
    }

    #[test]
    fn finish_drops_blank_rows() {
        let mut t = table(&["A"], &[&[Some("x")], &[None]]);
        assert_eq!(finish_splices(&mut t), 1);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn splice_rejects_unknown_column() {
        let mut t = table(&["A"], &[&[Some("x")]]);
        let err = splice(&mut t, RowKey::original(0), 3, &strings(&["x"]), SpliceMode::Insert);
        assert!(matches!(err, Err(CleanError::RangeOutOfBounds { .. })));
    }

    #[test]
    fn distribute_advances_only_on_flagged_rows() {
        let mut t = table(
            &["Emisor", "Calificación"],
            &[
                &[Some("Banco A\nBanco B"), Some("AA py")],
                &[None, None],
                &[None, Some("A+ py")],
                &[None, None],
            ],
        );
        let touched = distribute_down(&mut t, 0, 0, &strings(&["Banco A", "Banco B"]), |row| {
            row.get(1).is_some()
        })
        .unwrap();
        assert_eq!(touched, 3);
        assert_eq!(
            column(&t, 0),
            vec![some("Banco A"), some("Banco A"), some("Banco B"), None]
        );
    }

    #[test]
    fn stacked_values_skip_blank_lines() {
        assert_eq!(stacked_values("2027\n\n 2028 "), ["2027", "2028"]);
    }
}
