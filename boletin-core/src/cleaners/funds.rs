use super::CompiledRules;
use crate::error::CleanResult;
use crate::table::WorkTable;
use tracing::debug;

/// Mutual and investment funds. Fund rows are never visually merged, so a
/// row with a missing cell is extraction debris and is dropped rather than
/// filled.
pub fn clean(table: &mut WorkTable, rules: &CompiledRules) -> CleanResult<()> {
    rules.drop_noise(table);
    let dropped = table.drop_incomplete_rows();
    if dropped > 0 {
        debug!("🧹 dropped {} incomplete fund rows", dropped);
    }
    rules.split_fields(table)?;
    rules.compact(table);
    Ok(())
}
