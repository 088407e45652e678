use crate::table::WorkTable;

/// Replace each missing cell with the nearest preceding value in its column.
///
/// Columns are processed independently, top to bottom, with no look-ahead.
/// Cells above the first value of a column stay missing. Idempotent.
pub fn forward_fill(table: &mut WorkTable) -> usize {
    let mut filled = 0;
    for col in 0..table.width() {
        let mut last: Option<String> = None;
        for row in table.rows_mut() {
            if row.cells[col].is_some() {
                last = row.cells[col].clone();
            } else if let Some(value) = &last {
                row.cells[col] = Some(value.clone());
                filled += 1;
            }
        }
    }
    filled
}
