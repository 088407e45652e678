use thiserror::Error;

/// Failures raised while repairing a single category table.
///
/// None of these abort the document: the pipeline degrades the affected
/// category to an empty table and keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanError {
    #[error("expected column '{0}' is missing")]
    MissingColumn(String),

    #[error("row {row} has {actual} cells, expected {expected}")]
    StructuralViolation {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("column range {start}..{end} is out of bounds for a row of {width} cells")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        width: usize,
    },
}

pub type CleanResult<T> = std::result::Result<T, CleanError>;
