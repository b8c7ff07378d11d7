//! Spending aggregation for the dashboard charts.
//!
//! Expenses are counted the same way as in the rollup: only dated expenses
//! in the report year with a non-zero amount, for teams with an allocation
//! row, that pass the team and classification filters.

use std::collections::{HashMap, HashSet};

use time::Month;

use crate::{
    ledger::{AllocationRecord, ExpenseRecord},
    rollup::{ClassificationFilter, Period, PeriodSpan, TeamFilter},
};

/// The expenses that count towards spending in `year`, with their month.
fn counted_expenses<'a>(
    allocations: &'a [AllocationRecord],
    expenses: &'a [ExpenseRecord],
    team_filter: &'a TeamFilter,
    year: i32,
    classification: &'a ClassificationFilter,
) -> impl Iterator<Item = (&'a ExpenseRecord, Month)> {
    let teams = allocations
        .iter()
        .map(|allocation| allocation.team_id.as_str())
        .collect::<HashSet<_>>();

    expenses.iter().filter_map(move |expense| {
        let month = expense.month_in_year(year)?;

        let is_counted = teams.contains(expense.team_id.as_str())
            && team_filter.matches(&expense.team_id)
            && classification.matches(expense);

        is_counted.then_some((expense, month))
    })
}

/// Total spending per month of `year`, indexed from January.
pub(super) fn monthly_spend(
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
    team_filter: &TeamFilter,
    year: i32,
    classification: &ClassificationFilter,
) -> [f64; 12] {
    let mut totals = [0.0; 12];

    for (expense, month) in
        counted_expenses(allocations, expenses, team_filter, year, classification)
    {
        totals[usize::from(u8::from(month)) - 1] += expense.amount;
    }

    totals
}

/// Spending per category in `period`, largest first.
///
/// Categories whose expenses cancel out to zero are left out.
pub(super) fn spend_by_category(
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
    team_filter: &TeamFilter,
    period: &Period,
    classification: &ClassificationFilter,
) -> Vec<(String, f64)> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for (expense, month) in
        counted_expenses(allocations, expenses, team_filter, period.year, classification)
    {
        let in_span = match period.span {
            PeriodSpan::Cumulative => true,
            PeriodSpan::Month(target) => month == target,
        };

        if in_span {
            *totals.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
        }
    }

    let mut totals = totals
        .into_iter()
        .filter(|(_, amount)| *amount != 0.0)
        .map(|(category, amount)| (category.to_owned(), amount))
        .collect::<Vec<_>>();
    totals.sort_by(|(a_name, a), (b_name, b)| b.total_cmp(a).then_with(|| a_name.cmp(b_name)));

    totals
}
