//! FILENAME: tabular/src/reconcile.rs
//! PURPOSE: Forward-fill of sparse grouping columns.
//! CONTEXT: Sheet authors often write a country or market label once and
//! leave the cells below it blank. A single top-to-bottom sweep rewrites
//! each grouping cell to the most recent non-empty label above it. Record
//! order is never changed.

use crate::roles::{ColumnRole, RoleMapping};
use crate::scalar::Scalar;
use crate::table::Table;

/// How many originally-blank cells received a propagated label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillSummary {
    pub country_filled: usize,
    pub market_filled: usize,
}

impl FillSummary {
    pub fn total(&self) -> usize {
        self.country_filled + self.market_filled
    }
}

/// Forward-fills the country and market columns, resolving them with the
/// shared role rules.
pub fn forward_fill(table: &Table) -> (Table, FillSummary) {
    let roles = RoleMapping::resolve(table.headers());
    forward_fill_with(table, &roles)
}

/// Forward-fills using an already resolved mapping. If neither the country
/// nor the market role resolved, the table comes back unchanged.
pub fn forward_fill_with(table: &Table, roles: &RoleMapping) -> (Table, FillSummary) {
    let mut filled = table.clone();
    let mut summary = FillSummary::default();

    let columns = [
        roles.column(ColumnRole::Country),
        roles.column(ColumnRole::Market),
    ];
    if columns.iter().all(Option::is_none) {
        return (filled, summary);
    }

    let mut last_seen = [String::new(), String::new()];

    for row in 0..filled.len() {
        for (slot, column) in columns.iter().enumerate() {
            let Some(column) = *column else {
                continue;
            };
            let current = match filled.cell(row, column) {
                Some(cell) => cell.trimmed(),
                None => continue,
            };

            if !current.is_empty() {
                last_seen[slot] = current;
            } else if !last_seen[slot].is_empty() {
                match slot {
                    0 => summary.country_filled += 1,
                    _ => summary.market_filled += 1,
                }
            }

            // Rows above the first label keep their (blank) cell.
            if !last_seen[slot].is_empty() {
                filled.replace_cell(row, column, Scalar::Text(last_seen[slot].clone()));
            }
        }
    }

    (filled, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rows: &[[&str; 3]]) -> Table {
        Table::new(
            vec!["Country".into(), "Prologis Market".into(), "Park".into()],
            rows.iter()
                .map(|r| r.iter().map(|s| Scalar::text(*s)).collect())
                .collect(),
        )
    }

    fn column(table: &Table, name: &str) -> Vec<String> {
        (0..table.len())
            .map(|r| table.value(r, name).unwrap().to_text().into_owned())
            .collect()
    }

    #[test]
    fn fills_blank_cells_downward() {
        let table = t(&[
            ["", "", "P0"],
            ["Poland", "Warsaw", "P1"],
            ["", "", "P2"],
            ["  ", "Poznan ", "P3"],
            ["Czechia", "", "P4"],
        ]);
        let (filled, summary) = forward_fill(&table);

        assert_eq!(column(&filled, "Country"), ["", "Poland", "Poland", "Poland", "Czechia"]);
        assert_eq!(column(&filled, "Prologis Market"), ["", "Warsaw", "Warsaw", "Poznan", "Poznan"]);
        assert_eq!(column(&filled, "Park"), ["P0", "P1", "P2", "P3", "P4"]);
        assert_eq!(summary.country_filled, 2);
        assert_eq!(summary.market_filled, 2);
    }

    #[test]
    fn idempotent() {
        let table = t(&[
            ["Poland", "Warsaw", "A"],
            ["", "", "B"],
            ["", "Lodz", "C"],
            ["", "", "D"],
        ]);
        let (once, _) = forward_fill(&table);
        let (twice, second) = forward_fill(&once);
        assert_eq!(once, twice);
        assert_eq!(second.total(), 0);
    }

    #[test]
    fn unchanged_without_grouping_columns() {
        let table = Table::new(
            vec!["Name".into(), "Value".into()],
            vec![vec![Scalar::text(""), Scalar::text("1")]],
        );
        let (filled, summary) = forward_fill(&table);
        assert_eq!(filled, table);
        assert_eq!(summary, FillSummary::default());
    }

    #[test]
    fn numeric_labels_become_text() {
        let table = Table::new(
            vec!["Country".into()],
            vec![vec![Scalar::Number(7.0)], vec![Scalar::empty()]],
        );
        let (filled, _) = forward_fill(&table);
        assert_eq!(filled.value(1, "Country"), Some(&Scalar::text("7")));
    }
}
