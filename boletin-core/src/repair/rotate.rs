use crate::error::{CleanError, CleanResult};
use crate::table::WorkTable;
use crate::text::normalize;
use crate::types::Cell;
use regex::Regex;
use std::ops::Range;

/// Rotate the cells in `range` by `shift` positions to the right.
///
/// A shift of 1 moves the last value of the range to its front; negative
/// shifts rotate left. Rotating by `k` and then `-k` restores the row.
pub fn rotate_cells(cells: &mut [Cell], range: Range<usize>, shift: isize) -> CleanResult<()> {
    if range.start > range.end || range.end > cells.len() {
        return Err(CleanError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            width: cells.len(),
        });
    }
    let slice = &mut cells[range];
    if slice.is_empty() {
        return Ok(());
    }
    let k = shift.rem_euclid(slice.len() as isize) as usize;
    slice.rotate_right(k);
    Ok(())
}

/// Row-local offset repair: when the trigger column holds content that
/// belongs elsewhere, the row's values over `from..=to` are rotated one
/// position to the right.
#[derive(Debug, Clone)]
pub struct RotationRule {
    pub trigger: usize,
    pub pattern: Regex,
    pub from: usize,
    pub to: usize,
}

impl RotationRule {
    /// Resolve a rule against a table's header. Returns `None` when a named
    /// column is absent from this edition's layout.
    pub fn resolve(
        table: &WorkTable,
        trigger: &str,
        pattern: &Regex,
        from: &str,
        to: Option<&str>,
    ) -> Option<Self> {
        let trigger = table.column_index(trigger)?;
        let from = table.column_index(from)?;
        let to = match to {
            Some(name) => table.column_index(name)?,
            None => table.width().checked_sub(1)?,
        };
        (from < to).then(|| Self {
            trigger,
            pattern: pattern.clone(),
            from,
            to,
        })
    }

    pub fn applies_to(&self, cells: &[Cell]) -> bool {
        cells
            .get(self.trigger)
            .and_then(|c| c.as_deref())
            .is_some_and(|v| self.pattern.is_match(normalize(v).trim()))
    }

    /// Rotate every flagged row. Returns how many rows were corrected.
    pub fn apply(&self, table: &mut WorkTable) -> CleanResult<usize> {
        let mut rotated = 0;
        for row in table.rows_mut() {
            if self.applies_to(&row.cells) {
                rotate_cells(&mut row.cells, self.from..self.to + 1, 1)?;
                rotated += 1;
            }
        }
        table.validate()?;
        Ok(rotated)
    }
}
