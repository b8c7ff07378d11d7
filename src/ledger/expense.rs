use crate::{
    Error,
    ledger::{
        AmountCell, ExpenseRecord, LoadWarning, SchemaConfig, UNCLASSIFIED,
        allocation::missing_column_message,
        parse_amount, parse_date,
        schema::{ColumnField, ResolvedColumns},
    },
    source::Table,
};

const TABLE: &str = "expenses";

/// Subcategory is resolved before category so that a header like "세부항목"
/// is not claimed by the category alias "항목".
const CLAIM_ORDER: [ColumnField; 6] = [
    ColumnField::Subcategory,
    ColumnField::Category,
    ColumnField::Team,
    ColumnField::Date,
    ColumnField::Amount,
    ColumnField::Description,
];

pub(super) fn load_expenses(
    table: &Table,
    schema: &SchemaConfig,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<ExpenseRecord>, Error> {
    let columns = schema.resolve(&table.headers, &CLAIM_ORDER, &[]);

    let team_column = columns.get(ColumnField::Team).ok_or(Error::MissingColumn {
        table: TABLE,
        column: ColumnField::Team.name(),
    })?;

    for field in [
        ColumnField::Date,
        ColumnField::Amount,
        ColumnField::Category,
        ColumnField::Subcategory,
    ] {
        if columns.get(field).is_none() {
            warnings.push(LoadWarning::new(TABLE, missing_column_message(schema, field)));
        }
    }

    let mut expenses = Vec::new();
    let mut missing_team = 0;
    let mut invalid_amounts = 0;
    let mut invalid_dates = 0;

    for row in &table.rows {
        let team_id = Table::cell(row, team_column).trim();
        if team_id.is_empty() {
            missing_team += 1;
            continue;
        }

        let amount = match columns
            .get(ColumnField::Amount)
            .map(|column| parse_amount(Table::cell(row, column)))
        {
            Some(AmountCell::Number(amount)) => amount,
            Some(AmountCell::Invalid) => {
                invalid_amounts += 1;
                0.0
            }
            Some(AmountCell::Blank) | None => 0.0,
        };

        if amount == 0.0 {
            continue;
        }

        let date = parse_date(text(row, &columns, ColumnField::Date));
        if date.is_none() && columns.get(ColumnField::Date).is_some() {
            invalid_dates += 1;
        }

        let classification = |field| match text(row, &columns, field) {
            "" => UNCLASSIFIED.to_owned(),
            value => value.to_owned(),
        };

        expenses.push(ExpenseRecord {
            team_id: team_id.to_owned(),
            date,
            amount,
            category: classification(ColumnField::Category),
            subcategory: classification(ColumnField::Subcategory),
            description: text(row, &columns, ColumnField::Description).to_owned(),
        });
    }

    if missing_team > 0 {
        warnings.push(LoadWarning::new(
            TABLE,
            format!("{missing_team} rows without a team were ignored"),
        ));
    }

    if invalid_amounts > 0 {
        warnings.push(LoadWarning::new(
            TABLE,
            format!("{invalid_amounts} rows with a non-numeric amount were ignored"),
        ));
    }

    if invalid_dates > 0 {
        warnings.push(LoadWarning::new(
            TABLE,
            format!("{invalid_dates} rows with an unreadable date are excluded from the totals"),
        ));
    }

    Ok(expenses)
}

fn text<'a>(row: &'a [String], columns: &ResolvedColumns, field: ColumnField) -> &'a str {
    columns
        .get(field)
        .map(|column| Table::cell(row, column).trim())
        .unwrap_or_default()
}
