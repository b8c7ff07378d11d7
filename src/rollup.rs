//! The per-team budget rollup.
//!
//! For a single month the available budget is simulated month by month from
//! January: each month adds the base and supplemental allocation to what was
//! carried over and subtracts what was spent. The balance left at the end of
//! January is not carried into February, so every team starts February with a
//! clean slate. The cumulative view skips the simulation and compares the
//! whole year's allocation with the whole year's spending.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use time::Month;

use crate::ledger::{AllocationRecord, ExpenseRecord};

/// Which teams a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeamFilter {
    /// Every team with an allocation row.
    #[default]
    All,
    /// A single team.
    Team(String),
}

impl TeamFilter {
    /// Whether `team_id` passes the filter.
    pub fn matches(&self, team_id: &str) -> bool {
        match self {
            TeamFilter::All => true,
            TeamFilter::Team(team) => team == team_id,
        }
    }
}

/// The span of a reporting period within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodSpan {
    /// January through December as a flat total.
    #[default]
    Cumulative,
    /// A single calendar month.
    Month(Month),
}

impl Display for PeriodSpan {
    /// Formats the span as it appears in query strings: `cumulative` or the month number.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodSpan::Cumulative => write!(f, "cumulative"),
            PeriodSpan::Month(month) => write!(f, "{}", u8::from(*month)),
        }
    }
}

impl FromStr for PeriodSpan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.eq_ignore_ascii_case("cumulative") {
            return Ok(PeriodSpan::Cumulative);
        }

        value
            .parse::<u8>()
            .ok()
            .and_then(|month| Month::try_from(month).ok())
            .map(PeriodSpan::Month)
            .ok_or_else(|| format!("\"{value}\" is not \"cumulative\" or a month from 1 to 12"))
    }
}

/// A reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// The year whose expenses are counted.
    pub year: i32,
    /// The whole year or a single month of it.
    pub span: PeriodSpan,
}

/// Narrows which expenses count as spent.
///
/// The filter never changes the available budget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationFilter {
    /// Only count expenses in this category.
    pub category: Option<String>,
    /// Only count expenses in this subcategory.
    pub subcategory: Option<String>,
}

impl ClassificationFilter {
    /// Whether the filter excludes anything.
    pub fn is_active(&self) -> bool {
        self.category.is_some() || self.subcategory.is_some()
    }

    /// Whether `expense` passes the filter.
    pub fn matches(&self, expense: &ExpenseRecord) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| *category == expense.category)
            && self
                .subcategory
                .as_ref()
                .is_none_or(|subcategory| *subcategory == expense.subcategory)
    }
}

/// A team's budget position for a period.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupResult {
    /// The team the figures are for.
    pub team_id: String,
    /// The budget usable in the period.
    pub available_budget: f64,
    /// What was spent in the period.
    pub spent: f64,
    /// `available_budget - spent`, negative when overspent.
    pub balance: f64,
    /// `spent` as a percentage of `available_budget`, zero when nothing is available.
    pub utilization_pct: f64,
}

/// The sum of a set of [RollupResult]s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollupTotals {
    /// The sum of the available budgets.
    pub available_budget: f64,
    /// The sum of the spending.
    pub spent: f64,
    /// The sum of the balances.
    pub balance: f64,
    /// Total spending as a percentage of the total available budget.
    pub utilization_pct: f64,
}

impl RollupTotals {
    /// Add up `results`.
    pub fn from_results(results: &[RollupResult]) -> Self {
        let available_budget: f64 = results.iter().map(|result| result.available_budget).sum();
        let spent: f64 = results.iter().map(|result| result.spent).sum();

        Self {
            available_budget,
            spent,
            balance: available_budget - spent,
            utilization_pct: utilization(spent, available_budget),
        }
    }
}

/// `spent` as a percentage of `available`, or zero if nothing is available.
///
/// The result is not clamped, overspending gives values over 100.
pub fn utilization(spent: f64, available: f64) -> f64 {
    if available > 0.0 {
        spent / available * 100.0
    } else {
        0.0
    }
}

/// Compute the rollup for every team that passes `team_filter`.
///
/// See [compute_rollup_filtered] for the rules.
pub fn compute_rollup(
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
    team_filter: &TeamFilter,
    period: &Period,
) -> Vec<RollupResult> {
    compute_rollup_filtered(
        allocations,
        expenses,
        team_filter,
        period,
        &ClassificationFilter::default(),
    )
}

/// Compute the rollup where only expenses matching `classification` count as spent.
///
/// Results are in allocation order. Teams without an allocation row never
/// appear. When reporting on all teams, teams with nothing allocated for the
/// year and nothing spent are left out, unless a classification filter is active in
/// which case only teams with filtered spending are shown. A single team is
/// always shown.
pub fn compute_rollup_filtered(
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
    team_filter: &TeamFilter,
    period: &Period,
    classification: &ClassificationFilter,
) -> Vec<RollupResult> {
    let spending = monthly_spending(expenses, period.year, classification);
    let no_spending = TeamSpending::default();

    allocations
        .iter()
        .filter(|allocation| team_filter.matches(&allocation.team_id))
        .filter_map(|allocation| {
            let team_spending = spending
                .get(allocation.team_id.as_str())
                .unwrap_or(&no_spending);
            let result = rollup_team(allocation, team_spending, period.span);

            let is_visible = match team_filter {
                TeamFilter::Team(_) => true,
                TeamFilter::All if classification.is_active() => result.spent != 0.0,
                TeamFilter::All => allocation.annual_total() != 0.0 || result.spent != 0.0,
            };

            is_visible.then_some(result)
        })
        .collect()
}

/// A team's spending per month, indexed from January.
#[derive(Debug, Default)]
struct TeamSpending {
    all: [f64; 12],
    matching: [f64; 12],
}

fn monthly_spending<'a>(
    expenses: &'a [ExpenseRecord],
    year: i32,
    classification: &ClassificationFilter,
) -> HashMap<&'a str, TeamSpending> {
    let mut spending: HashMap<&str, TeamSpending> = HashMap::new();

    for expense in expenses {
        let Some(month) = expense.month_in_year(year) else {
            continue;
        };

        let index = usize::from(u8::from(month)) - 1;
        let team = spending.entry(expense.team_id.as_str()).or_default();
        team.all[index] += expense.amount;

        if classification.matches(expense) {
            team.matching[index] += expense.amount;
        }
    }

    spending
}

fn rollup_team(
    allocation: &AllocationRecord,
    spending: &TeamSpending,
    span: PeriodSpan,
) -> RollupResult {
    let (available_budget, spent) = match span {
        PeriodSpan::Cumulative => (allocation.annual_total(), spending.matching.iter().sum()),
        PeriodSpan::Month(target) => {
            let target = u8::from(target);
            let mut carry = 0.0;
            let mut available = 0.0;

            for month in 1..=target {
                available = carry + allocation.base_monthly_amount + allocation.supplemental(month);
                let spent = spending.all[usize::from(month) - 1];

                carry = if month == 1 { 0.0 } else { available - spent };
            }

            (available, spending.matching[usize::from(target) - 1])
        }
    };

    RollupResult {
        team_id: allocation.team_id.clone(),
        available_budget,
        spent,
        balance: available_budget - spent,
        utilization_pct: utilization(spent, available_budget),
    }
}
