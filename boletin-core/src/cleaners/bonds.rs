use super::CompiledRules;
use crate::config::ColumnNames;
use crate::error::CleanResult;
use crate::repair::{
    distribute_down, finish_splices, forward_fill, splice, stacked_values, SpliceMode,
};
use crate::table::{RowKey, WorkTable};
use regex::Regex;
use tracing::debug;

/// Guarani bonds: composite "rating yield" cells are split and stacked
/// maturities spill into the rows below.
pub fn clean_gs(
    table: &mut WorkTable,
    rules: &CompiledRules,
    names: &ColumnNames,
) -> CleanResult<()> {
    table.require_column(&names.issuer)?;
    rules.drop_noise(table);
    rules.rotate(table)?;
    rules.split_fields(table)?;
    if let Some(maturity) = table.column_index(&names.maturity) {
        let stacked = splice_stacked(table, maturity, SpliceMode::FillBelow)?;
        if stacked > 0 {
            debug!("📚 unpacked {} stacked maturity cells", stacked);
        }
    }
    finish_splices(table);
    forward_fill(table);
    rules.compact(table);
    Ok(())
}

/// Dollar bonds: stacked issuer names are distributed over the rows they
/// head and packed "rating yield yield" cells spill their yields downwards.
pub fn clean_usd(
    table: &mut WorkTable,
    rules: &CompiledRules,
    names: &ColumnNames,
) -> CleanResult<()> {
    let issuer = table.require_column(&names.issuer)?;
    let rating = table.require_column(&names.rating)?;
    rules.drop_noise(table);
    rules.rotate(table)?;
    distribute_issuers(table, issuer, rating)?;
    if let (Some(tokens), Some(yield_col)) =
        (&rules.yield_tokens, table.column_index(&names.yield_))
    {
        spill_yields(table, rating, yield_col, tokens);
    }
    rules.split_fields(table)?;
    finish_splices(table);
    forward_fill(table);
    rules.compact(table);
    Ok(())
}

/// Splice every stacked cell of `col`. Returns how many cells were unpacked.
fn splice_stacked(table: &mut WorkTable, col: usize, mode: SpliceMode) -> CleanResult<usize> {
    let stacked: Vec<(RowKey, Vec<String>)> = table
        .rows()
        .iter()
        .filter_map(|r| {
            let values = stacked_values(r.get(col)?);
            (values.len() > 1).then_some((r.key, values))
        })
        .collect();
    for (key, values) in &stacked {
        splice(table, *key, col, values, mode)?;
    }
    Ok(stacked.len())
}

fn distribute_issuers(table: &mut WorkTable, issuer: usize, rating: usize) -> CleanResult<()> {
    let stacked: Vec<(usize, Vec<String>)> = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(pos, r)| {
            let values = stacked_values(r.get(issuer)?);
            (values.len() > 1).then_some((pos, values))
        })
        .collect();
    for (start, values) in stacked {
        let touched = distribute_down(table, start, issuer, &values, |row| row.get(rating).is_some())?;
        debug!("📚 distributed {} issuers over {} rows", values.len(), touched);
    }
    Ok(())
}

/// A rating cell holding several tokens keeps its rating token; the k-th
/// yield token goes to the yield column k rows further down.
fn spill_yields(table: &mut WorkTable, rating: usize, yield_col: usize, tokens: &Regex) {
    let packed: Vec<(RowKey, Option<String>, Vec<String>)> = table
        .rows()
        .iter()
        .filter_map(|r| {
            let found: Vec<&str> = tokens.find_iter(r.get(rating)?).map(|m| m.as_str()).collect();
            if found.len() < 2 {
                return None;
            }
            let (yields, ratings): (Vec<&str>, Vec<&str>) = found
                .into_iter()
                .partition(|t| t.chars().any(|c| c.is_ascii_digit()));
            Some((
                r.key,
                ratings.last().map(|s| s.trim().to_string()),
                yields.into_iter().map(String::from).collect(),
            ))
        })
        .collect();

    for (key, rating_token, yields) in packed {
        if let (Some(token), Some(pos)) = (rating_token, table.position_of(key)) {
            table.set_cell(pos, rating, Some(token));
        }
        for (k, value) in yields.into_iter().enumerate() {
            table
                .row_mut_or_insert(RowKey::original(key.base + k))
                .cells[yield_col] = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::CleanError;
    use crate::table::table;

    fn row(t: &WorkTable, pos: usize) -> Vec<&str> {
        (0..t.width()).map(|c| t.cell(pos, c).unwrap_or("")).collect()
    }

    #[test]
    fn guarani_bonds_pipeline() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_gs).unwrap();
        let mut t = table(
            &["Emisor", "Calificación", "Rendimiento", "Vencimiento", "Disponibilidad"],
            &[
                &[Some("Tasas de interés"), None, None, None, None],
                &[Some("Banco A"), Some("AA- py 4,56%"), None, Some("2027\n2028"), Some("1 000 000")],
                &[None, None, Some("5,00%"), None, Some("500 000")],
                &[Some("Banco B"), Some("A+ py"), Some("6,00%"), Some("2030"), Some("250 000")],
            ],
        );
        clean_gs(&mut t, &rules, &config.columns).unwrap();

        assert_eq!(t.len(), 3);
        assert_eq!(row(&t, 0), ["Banco A", "AA- py", "4,56%", "2027", "1000000"]);
        assert_eq!(row(&t, 1), ["Banco A", "AA- py", "5,00%", "2028", "500000"]);
        assert_eq!(row(&t, 2), ["Banco B", "A+ py", "6,00%", "2030", "250000"]);
    }

    #[test]
    fn numeric_issuer_row_is_shifted_back() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_gs).unwrap();
        let mut t = table(
            &["Emisor", "Rendimiento", "Vencimiento", "Disponibilidad"],
            &[
                &[Some("Emisor"), Some("Rendimiento"), None, None],
                &[Some("Banco A"), Some("8,00%"), Some("2028"), Some("1 000 000")],
                &[Some("9,00%"), Some("2030"), Some("500 000"), None],
            ],
        );
        clean_gs(&mut t, &rules, &config.columns).unwrap();

        assert_eq!(t.len(), 2);
        assert_eq!(row(&t, 0), ["Banco A", "8,00%", "2028", "1000000"]);
        assert_eq!(row(&t, 1), ["Banco A", "9,00%", "2030", "500000"]);
    }

    #[test]
    fn stacked_maturity_inserts_rows_when_below_is_taken() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_gs).unwrap();
        let mut t = table(
            &["Emisor", "Vencimiento"],
            &[
                &[Some("Banco A"), Some("2027\n2028")],
                &[Some("Banco B"), Some("2031")],
            ],
        );
        clean_gs(&mut t, &rules, &config.columns).unwrap();
        assert_eq!(row(&t, 0), ["Banco A", "2027"]);
        assert_eq!(row(&t, 1), ["Banco A", "2028"]);
        assert_eq!(row(&t, 2), ["Banco B", "2031"]);
    }

    #[test]
    fn dollar_bonds_pipeline() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_usd).unwrap();
        let mut t = table(
            &["Emisor", "Calificación", "Rendimiento", "Vencimiento", "Plazo Residual en años", "Disponibilidad"],
            &[
                &[Some("Bonos en dólares"), None, None, None, None, None],
                &[None, Some("Entidad calificadora"), None, None, None, None],
                &[Some("Banco A\nBanco B"), Some("AA py 5,25% 5,50%"), None, Some("2027"), Some("3 ,1"), Some("10 000")],
                &[None, None, None, Some("2028"), Some("4,1"), Some("20 000")],
                &[None, Some("A+ py"), Some("6,00%"), Some("2029"), Some("5,2"), Some("5 000")],
            ],
        );
        clean_usd(&mut t, &rules, &config.columns).unwrap();

        assert_eq!(t.len(), 3);
        assert_eq!(row(&t, 0), ["Banco A", "AA py", "5,25%", "2027", "3,1", "10000"]);
        assert_eq!(row(&t, 1), ["Banco A", "AA py", "5,50%", "2028", "4,1", "20000"]);
        assert_eq!(row(&t, 2), ["Banco B", "A+ py", "6,00%", "2029", "5,2", "5000"]);
    }

    #[test]
    fn single_token_rating_is_left_alone() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_usd).unwrap();
        let mut t = table(
            &["Emisor", "Calificación", "Rendimiento"],
            &[&[Some("Banco A"), Some("AA py"), Some("5,00%")]],
        );
        clean_usd(&mut t, &rules, &config.columns).unwrap();
        assert_eq!(row(&t, 0), ["Banco A", "AA py", "5,00%"]);
    }

    #[test]
    fn missing_issuer_column_is_reported() {
        let config = EngineConfig::default();
        let rules = CompiledRules::compile(&config.cleaners.bonds_gs).unwrap();
        let mut t = table(&["Fondo", "Calificación"], &[&[Some("x"), Some("y")]]);
        assert_eq!(
            clean_gs(&mut t, &rules, &config.columns),
            Err(CleanError::MissingColumn("Emisor".to_string()))
        );
    }
}
