// Working table shared by every repair step.
//
// Each row carries an explicit ordering key instead of a fractional index:
// original rows are (i, 0) and rows synthesized after row i are (i, 1), (i, 2)...
// `resequence` stable-sorts by key and renumbers to a dense (n, 0) sequence.

use crate::error::{CleanError, CleanResult};
use crate::text::{header_text, normalize};
use crate::types::{cell_from, Cell, TableData};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub base: usize,
    pub sub: usize,
}

impl RowKey {
    pub fn original(base: usize) -> Self {
        Self { base, sub: 0 }
    }

    pub fn after(self, offset: usize) -> Self {
        Self {
            base: self.base,
            sub: self.sub + offset,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.sub > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkRow {
    pub key: RowKey,
    pub cells: Vec<Cell>,
}

impl WorkRow {
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    pub fn get(&self, col: usize) -> Option<&str> {
        self.cells.get(col).and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkTable {
    columns: Vec<String>,
    rows: Vec<WorkRow>,
}

impl WorkTable {
    /// Build a working copy. Header cells are normalized; data cells that are
    /// blank once normalized, or "None", become missing. Rows are padded or cut
    /// to the header width.
    pub fn new(header: &[Cell], rows: &[Vec<Cell>]) -> Self {
        let columns: Vec<String> = header
            .iter()
            .map(|c| c.as_deref().map(header_text).unwrap_or_default())
            .collect();
        let width = columns.len();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut cells: Vec<Cell> = row.iter().map(|c| work_cell(c.as_deref())).collect();
                cells.resize(width, None);
                WorkRow {
                    key: RowKey::original(i),
                    cells,
                }
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[WorkRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [WorkRow] {
        &mut self.rows
    }

    /// Case-insensitive lookup of a column by (normalized) header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = header_text(name).to_lowercase();
        self.columns.iter().position(|c| c.to_lowercase() == wanted)
    }

    pub fn require_column(&self, name: &str) -> CleanResult<usize> {
        self.column_index(name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col)) {
            *slot = value;
        }
    }

    pub fn position_of(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.key == key)
    }

    /// Row with the given key, appending an empty row if none exists yet.
    /// Appended rows find their place on the next `resequence`.
    pub fn row_mut_or_insert(&mut self, key: RowKey) -> &mut WorkRow {
        let pos = match self.position_of(key) {
            Some(pos) => pos,
            None => {
                self.rows.push(WorkRow {
                    key,
                    cells: vec![None; self.columns.len()],
                });
                self.rows.len() - 1
            }
        };
        &mut self.rows[pos]
    }

    /// Stable sort by ordering key, then renumber to a dense sequence.
    pub fn resequence(&mut self) {
        self.rows.sort_by_key(|r| r.key);
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.key = RowKey::original(i);
        }
    }

    pub fn drop_blank_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !r.is_blank());
        before - self.rows.len()
    }

    /// Drop rows holding at least one missing cell.
    pub fn drop_incomplete_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.cells.iter().all(|c| c.is_some()));
        before - self.rows.len()
    }

    /// Drop unnamed columns that carry no value in any row.
    pub fn drop_blank_columns(&mut self) -> usize {
        let blank: Vec<usize> = (0..self.columns.len())
            .filter(|&col| {
                self.columns[col].is_empty() && self.rows.iter().all(|r| r.cells[col].is_none())
            })
            .collect();
        for &col in blank.iter().rev() {
            self.columns.remove(col);
            for row in &mut self.rows {
                row.cells.remove(col);
            }
        }
        blank.len()
    }

    /// Drop rows whose cell in `col` matches `pattern` (matched on normalized text).
    pub fn drop_rows_matching(&mut self, col: usize, pattern: &Regex) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|r| !r.get(col).is_some_and(|v| pattern.is_match(&normalize(v))));
        before - self.rows.len()
    }

    /// Position of the first row whose cell in `col` matches `pattern`.
    pub fn find_row(&self, col: usize, pattern: &Regex) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.get(col).is_some_and(|v| pattern.is_match(&normalize(v))))
    }

    /// Promote the row at `pos` to header and remove it. Missing header cells
    /// keep the current column name.
    pub fn promote_header(&mut self, pos: usize) {
        let row = self.rows.remove(pos);
        for (name, cell) in self.columns.iter_mut().zip(row.cells) {
            if let Some(text) = cell {
                let text = header_text(&text);
                if !text.is_empty() {
                    *name = text;
                }
            }
        }
    }

    /// Apply `f` to every present cell of a column.
    pub fn map_column<F>(&mut self, col: usize, f: F)
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            if let Some(Some(value)) = row.cells.get_mut(col) {
                *value = f(value);
            }
        }
    }

    /// Check that every row still matches the header width.
    pub fn validate(&self) -> CleanResult<()> {
        let expected = self.columns.len();
        for (row, r) in self.rows.iter().enumerate() {
            if r.cells.len() != expected {
                return Err(CleanError::StructuralViolation {
                    row,
                    expected,
                    actual: r.cells.len(),
                });
            }
        }
        Ok(())
    }

    /// Normalized, unique header names for output.
    pub fn output_columns(&self) -> Vec<String> {
        unique_columns(&self.columns)
    }

    /// Finish the table: validate, normalize every value, render missing cells
    /// as empty strings and drop rows left with no value at all.
    pub fn into_table_data(self, title: &str) -> CleanResult<TableData> {
        self.validate()?;
        let columns = self.output_columns();
        let data = self
            .rows
            .into_iter()
            .map(|r| {
                r.cells
                    .into_iter()
                    .map(|c| c.map(|v| normalize(&v).trim().to_string()).unwrap_or_default())
                    .collect::<Vec<String>>()
            })
            .filter(|values| values.iter().any(|v| !v.is_empty()))
            .collect();
        Ok(TableData {
            title: title.to_string(),
            columns,
            data,
        })
    }
}

/// Raw cell as seen by the repairs. Raw text is kept so stacked cells keep
/// their line breaks; glyph codes that decode to whitespace count as missing.
fn work_cell(text: Option<&str>) -> Cell {
    cell_from(text).filter(|v| !normalize(v).trim().is_empty())
}

/// Make header names unique: blanks get a positional name, repeats a suffix.
pub fn unique_columns(columns: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        let base = {
            let n = header_text(name);
            if n.is_empty() {
                format!("column_{}", i + 1)
            } else {
                n
            }
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base} ({n})");
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
pub(crate) fn table(header: &[&str], rows: &[&[Option<&str>]]) -> WorkTable {
    let header: Vec<Cell> = header.iter().map(|h| Some(h.to_string())).collect();
    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .map(|r| r.iter().map(|c| c.map(String::from)).collect())
        .collect();
    WorkTable::new(&header, &rows)
}
