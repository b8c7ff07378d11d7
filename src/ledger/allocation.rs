use std::collections::{BTreeMap, HashSet};

use crate::{
    Error,
    ledger::{AllocationRecord, AmountCell, LoadWarning, parse_amount, schema::ColumnField},
    source::Table,
};

use super::SchemaConfig;

const TABLE: &str = "allocations";

pub(super) fn load_allocations(
    table: &Table,
    schema: &SchemaConfig,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<AllocationRecord>, Error> {
    let supplemental_columns = schema.supplemental_columns(&table.headers);
    let claimed = supplemental_columns
        .iter()
        .map(|(index, _)| *index)
        .collect::<Vec<_>>();
    let columns = schema.resolve(
        &table.headers,
        &[ColumnField::Team, ColumnField::Base],
        &claimed,
    );

    let team_column = columns.get(ColumnField::Team).ok_or(Error::MissingColumn {
        table: TABLE,
        column: ColumnField::Team.name(),
    })?;

    let base_column = columns.get(ColumnField::Base);
    if base_column.is_none() {
        warnings.push(LoadWarning::new(
            TABLE,
            missing_column_message(schema, ColumnField::Base),
        ));
    }

    let mut seen = HashSet::new();
    let mut allocations = Vec::new();
    let mut invalid_cells = 0;

    for (index, row) in table.rows.iter().enumerate() {
        let team_id = Table::cell(row, team_column).trim();
        if team_id.is_empty() {
            continue;
        }

        if !seen.insert(team_id.to_owned()) {
            warnings.push(LoadWarning::new(
                TABLE,
                format!(
                    "row {} repeats team \"{team_id}\" and was ignored",
                    index + 2
                ),
            ));
            continue;
        }

        let mut read_amount = |column: usize, label: &str| match parse_amount(Table::cell(row, column)) {
            AmountCell::Number(value) if value < 0.0 => {
                warnings.push(LoadWarning::new(
                    TABLE,
                    format!("{label} for team \"{team_id}\" is negative and was treated as zero"),
                ));
                0.0
            }
            cell @ AmountCell::Invalid => {
                invalid_cells += 1;
                cell.value()
            }
            cell => cell.value(),
        };

        let base_monthly_amount = base_column
            .map(|column| read_amount(column, "the base allocation"))
            .unwrap_or_default();

        let mut supplemental_amounts = BTreeMap::new();
        for &(column, month) in &supplemental_columns {
            let amount = read_amount(column, &format!("the month {month} supplemental allocation"));
            if amount != 0.0 {
                *supplemental_amounts.entry(month).or_insert(0.0) += amount;
            }
        }

        allocations.push(AllocationRecord {
            team_id: team_id.to_owned(),
            base_monthly_amount,
            supplemental_amounts,
        });
    }

    if invalid_cells > 0 {
        warnings.push(LoadWarning::new(
            TABLE,
            format!("{invalid_cells} non-numeric amounts were treated as zero"),
        ));
    }

    Ok(allocations)
}

pub(super) fn missing_column_message(schema: &SchemaConfig, field: ColumnField) -> String {
    match schema.pinned_header(field) {
        Some(header) => format!(
            "no column named \"{header}\" for {}, every value was treated as empty",
            field.name()
        ),
        None => format!(
            "no {} column was found, every value was treated as empty",
            field.name()
        ),
    }
}
