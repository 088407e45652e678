use super::CompiledRules;
use crate::config::ColumnNames;
use crate::error::CleanResult;
use crate::repair::forward_fill;
use crate::table::WorkTable;

/// CDA and stocks sections of the combined block. These carry their own
/// header row under the block's header, so it is promoted first and the
/// remaining repairs run against the section's real column names.
pub fn clean(table: &mut WorkTable, rules: &CompiledRules, names: &ColumnNames) -> CleanResult<()> {
    let issuer = table.require_column(&names.issuer)?;
    rules.promote_header(table, issuer);
    rules.drop_noise(table);
    rules.rotate(table)?;
    rules.split_fields(table)?;
    table.drop_blank_rows();
    forward_fill(table);
    rules.compact(table);
    Ok(())
}
