//! The typed allocation and expense records that the rollup is computed from.
//!
//! Spreadsheet cells are coerced leniently: unreadable amounts become zero and
//! unreadable dates become `None`. Every coercion that loses information is
//! recorded as a [LoadWarning] so that it can be shown next to the report.

mod allocation;
mod expense;
mod schema;

use std::{collections::BTreeMap, fmt::Display};

use time::{
    Date, Month, format_description::BorrowedFormatItem, macros::format_description,
    parsing::Parsed,
};

pub use schema::{ColumnField, SchemaConfig};

use crate::{Error, source::SourceTables};

/// The category and subcategory given to expenses that do not have one.
pub const UNCLASSIFIED: &str = "-";

/// A team's budget for the year.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRecord {
    /// The unique team identifier.
    pub team_id: String,
    /// The recurring allocation the team receives every month.
    pub base_monthly_amount: f64,
    /// One-off top-ups keyed by month number (1 to 12).
    pub supplemental_amounts: BTreeMap<u8, f64>,
}

impl AllocationRecord {
    /// The supplemental amount for `month` (1 to 12), zero if there is none.
    pub fn supplemental(&self, month: u8) -> f64 {
        self.supplemental_amounts
            .get(&month)
            .copied()
            .unwrap_or_default()
    }

    /// The base allocation for all twelve months plus every supplemental amount.
    pub fn annual_total(&self) -> f64 {
        self.base_monthly_amount * 12.0 + self.supplemental_amounts.values().sum::<f64>()
    }
}

/// A single expense transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// The team the expense is charged to.
    pub team_id: String,
    /// When the expense occurred, `None` if the date could not be read.
    pub date: Option<Date>,
    /// The amount spent, negative for refunds.
    pub amount: f64,
    /// The top-level classification, [UNCLASSIFIED] if blank.
    pub category: String,
    /// The second-level classification, [UNCLASSIFIED] if blank.
    pub subcategory: String,
    /// A free-text note, may be empty.
    pub description: String,
}

impl ExpenseRecord {
    /// Whether the expense counts towards `year`.
    ///
    /// Expenses without a date, from another year, or with a zero amount never count.
    pub fn counts_in_year(&self, year: i32) -> bool {
        self.amount != 0.0 && self.date.is_some_and(|date| date.year() == year)
    }

    /// The month of the expense if it counts towards `year`.
    pub fn month_in_year(&self, year: i32) -> Option<Month> {
        if self.counts_in_year(year) {
            self.date.map(|date| date.month())
        } else {
            None
        }
    }
}

/// A note about data that was coerced or skipped while loading the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// The logical table the warning is about.
    pub table: &'static str,
    /// What was coerced or skipped.
    pub message: String,
}

impl LoadWarning {
    fn new(table: &'static str, message: impl Into<String>) -> Self {
        Self {
            table,
            message: message.into(),
        }
    }
}

impl Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.table, self.message)
    }
}

/// The allocations and expenses for a reporting year.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    /// The year that reports are computed for.
    pub year: i32,
    /// One record per team, in the order of the allocation table.
    pub allocations: Vec<AllocationRecord>,
    /// Every expense with a non-zero amount, in the order of the expense table.
    pub expenses: Vec<ExpenseRecord>,
    /// Notes about coerced or skipped data.
    pub warnings: Vec<LoadWarning>,
}

impl Ledger {
    /// Build the ledger from the raw source tables.
    ///
    /// # Errors
    /// Returns [Error::MissingColumn] if either table has no team column.
    pub fn load(tables: &SourceTables, schema: &SchemaConfig, year: i32) -> Result<Self, Error> {
        let mut warnings = Vec::new();

        let allocations = allocation::load_allocations(&tables.allocations, schema, &mut warnings)?;
        let expenses = expense::load_expenses(&tables.expenses, schema, &mut warnings)?;

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(Self {
            year,
            allocations,
            expenses,
            warnings,
        })
    }

    /// The team identifiers in allocation table order.
    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.allocations
            .iter()
            .map(|allocation| allocation.team_id.as_str())
    }

    /// Whether `team_id` has an allocation row.
    pub fn has_team(&self, team_id: &str) -> bool {
        self.teams().any(|team| team == team_id)
    }

    /// The distinct expense categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories = self
            .expenses
            .iter()
            .map(|expense| expense.category.clone())
            .collect::<Vec<_>>();
        categories.sort();
        categories.dedup();
        categories
    }

    /// The distinct subcategories, sorted, limited to `category` if given.
    pub fn subcategories(&self, category: Option<&str>) -> Vec<String> {
        let mut subcategories = self
            .expenses
            .iter()
            .filter(|expense| category.is_none_or(|category| expense.category == category))
            .map(|expense| expense.subcategory.clone())
            .collect::<Vec<_>>();
        subcategories.sort();
        subcategories.dedup();
        subcategories
    }
}

/// The result of reading a money cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AmountCell {
    Blank,
    Number(f64),
    Invalid,
}

impl AmountCell {
    fn value(self) -> f64 {
        match self {
            AmountCell::Number(value) => value,
            AmountCell::Blank | AmountCell::Invalid => 0.0,
        }
    }
}

/// Read a money cell such as `1,200,000`, `₩1,200`, `3,000원` or `(500)`.
///
/// A lone dash is the accounting notation for zero and is treated as blank.
fn parse_amount(cell: &str) -> AmountCell {
    let cleaned = cell
        .chars()
        .filter(|c| !matches!(c, ',' | '₩' | '$' | '원' | '\u{a0}') && !c.is_whitespace())
        .collect::<String>();

    if cleaned.is_empty() || cleaned == "-" {
        return AmountCell::Blank;
    }

    let (digits, sign) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (inner, -1.0),
        None => (cleaned.as_str(), 1.0),
    };

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => AmountCell::Number(sign * value),
        _ => AmountCell::Invalid,
    }
}

/// The date layouts found in the sheets, tried in order.
///
/// `YYYY. M. D.` is how Google Sheets writes dates in the Korean locale.
const DATE_FORMATS: [&[BorrowedFormatItem<'static>]; 6] = [
    format_description!("[year]-[month padding:none]-[day padding:none]"),
    format_description!("[year]/[month padding:none]/[day padding:none]"),
    format_description!("[year].[month padding:none].[day padding:none]"),
    format_description!("[year]. [month padding:none]. [day padding:none]."),
    format_description!("[year]. [month padding:none]. [day padding:none]"),
    format_description!("[year][month][day]"),
];

/// Read a date cell.
///
/// The date may be followed by a time, separated by whitespace or `T`
/// (e.g. `2024-01-05 13:45:00` or `2024-01-05T13:45:00Z`). The time is ignored.
fn parse_date(cell: &str) -> Option<Date> {
    let cell = cell.trim().as_bytes();

    DATE_FORMATS.iter().find_map(|format| {
        let mut parsed = Parsed::new();
        let rest = parsed.parse_items(cell, format).ok()?;

        match rest.first() {
            None | Some(b'T') => Date::try_from(parsed).ok(),
            Some(byte) if byte.is_ascii_whitespace() => Date::try_from(parsed).ok(),
            Some(_) => None,
        }
    })
}
