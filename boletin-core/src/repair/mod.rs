// Repair primitives shared by the category cleaners:
// - fill.rs: forward-fill of vertically merged cells
// - splice.rs: unpacking stacked multi-value cells into rows
// - rotate.rs: row-local column offset correction
// - split.rs: regex decomposition of composite cells

pub mod fill;
pub mod rotate;
pub mod splice;
pub mod split;

pub use fill::forward_fill;
pub use rotate::{rotate_cells, RotationRule};
pub use splice::{distribute_down, finish_splices, splice, stacked_values, SpliceMode};
pub use split::FieldSplitter;
