use crate::error::CleanResult;
use crate::table::WorkTable;
use regex::Regex;
use tracing::debug;

/// Decomposes a composite cell into several columns with a fixed pattern.
///
/// Capture group `i` of the pattern is written to `destinations[i]`. A cell the
/// pattern does not match is left verbatim in its source column.
#[derive(Debug, Clone)]
pub struct FieldSplitter {
    pub source: usize,
    pub pattern: Regex,
    pub destinations: Vec<usize>,
}

impl FieldSplitter {
    /// Resolve column names against a table header. Returns `None` if the
    /// source or any destination column is absent.
    pub fn resolve(
        table: &WorkTable,
        source: &str,
        pattern: &Regex,
        destinations: &[String],
    ) -> Option<Self> {
        let source = table.column_index(source)?;
        let destinations = destinations
            .iter()
            .map(|d| table.column_index(d))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            source,
            pattern: pattern.clone(),
            destinations,
        })
    }

    /// Matched groups in order, or `None` on a miss.
    pub fn split(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.pattern.captures(text.trim())?;
        let groups: Vec<String> = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().trim().to_string()).unwrap_or_default())
            .collect();
        (groups.len() == self.destinations.len()).then_some(groups)
    }

    /// Split every matching cell in place. Returns the number of rows split.
    pub fn apply(&self, table: &mut WorkTable) -> CleanResult<usize> {
        let mut count = 0;
        for row in table.rows_mut() {
            let Some(text) = row.get(self.source) else {
                continue;
            };
            let Some(groups) = self.split(text) else {
                continue;
            };
            debug!("✂️  split '{}' into {:?}", text, groups);
            for (&dest, value) in self.destinations.iter().zip(groups) {
                row.cells[dest] = (!value.is_empty()).then_some(value);
            }
            count += 1;
        }
        table.validate()?;
        Ok(count)
    }
}
