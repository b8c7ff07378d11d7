//! Defines the route handler for the page that lists the expense records behind a report.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link, truncate_text,
    },
    ledger::{ExpenseRecord, Ledger},
    navigation::NavBar,
    pagination::{
        PaginationConfig, clamp_page, create_pagination_indicators, page_count, pagination_view,
    },
    report::{ReportFilters, ReportQuery, ReportState, filter_fields},
    rollup::{Period, PeriodSpan},
};

/// Descriptions longer than this are cut short in the table.
const MAX_DESCRIPTION_GRAPHEMES: usize = 40;

/// The state needed for the transactions page.
#[derive(Clone)]
pub struct TransactionsState {
    /// The state shared by every report page.
    pub report: ReportState,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            report: ReportState::from_ref(state),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Whether `expense` falls in `period`.
///
/// Undated expenses are listed under the cumulative view so that they can be
/// found and fixed, but never under a single month.
fn in_period(expense: &ExpenseRecord, period: &Period) -> bool {
    match (expense.date, period.span) {
        (None, PeriodSpan::Cumulative) => true,
        (None, PeriodSpan::Month(_)) => false,
        (Some(date), PeriodSpan::Cumulative) => date.year() == period.year,
        (Some(date), PeriodSpan::Month(month)) => {
            date.year() == period.year && date.month() == month
        }
    }
}

/// The expenses that pass `filters`, newest first with undated expenses last.
fn filter_expenses<'a>(ledger: &'a Ledger, filters: &ReportFilters) -> Vec<&'a ExpenseRecord> {
    let period = filters.period(ledger.year);

    let mut expenses = ledger
        .expenses
        .iter()
        .filter(|expense| {
            filters.team.matches(&expense.team_id)
                && filters.classification.matches(expense)
                && in_period(expense, &period)
        })
        .collect::<Vec<_>>();

    // `None` sorts before `Some`, so reversing puts undated expenses last.
    expenses.sort_by(|a, b| b.date.cmp(&a.date));

    expenses
}

/// Render a page of the expenses that match the report filters.
pub async fn get_transactions_page(
    State(state): State<TransactionsState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let ledger = state.report.ledger().await?;
    let filters = ReportFilters::from_query(&query);
    let expenses = filter_expenses(&ledger, &filters);

    let config = &state.pagination_config;
    let page_size = config.default_page_size.max(1);
    let page_count = page_count(expenses.len(), page_size);
    let page = clamp_page(query.page.unwrap_or(config.default_page), page_count);

    let offset = usize::try_from((page - 1) * page_size).unwrap_or(usize::MAX);
    let page_size = usize::try_from(page_size).unwrap_or(usize::MAX);
    let page_rows = expenses
        .iter()
        .skip(offset)
        .take(page_size)
        .copied()
        .collect::<Vec<_>>();
    let total: f64 = expenses.iter().map(|expense| expense.amount).sum();

    let indicators = create_pagination_indicators(page, page_count, config.max_pages);
    let pagination = pagination_view(&indicators, |page| {
        filters.url(endpoints::TRANSACTIONS_VIEW, Some(page))
    });

    Ok(transactions_view(
        &ledger,
        &filters,
        &page_rows,
        expenses.len(),
        total,
        &pagination,
    )
    .into_response())
}

fn transactions_view(
    ledger: &Ledger,
    filters: &ReportFilters,
    expenses: &[&ExpenseRecord],
    match_count: usize,
    total: f64,
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let dashboard_link = link(
        &filters.url(endpoints::DASHBOARD_VIEW, None),
        "Back to the dashboard",
    );

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            form
                method="get"
                action=(endpoints::TRANSACTIONS_VIEW)
                class="w-full grid grid-cols-2 lg:grid-cols-5 gap-4 items-end mb-6
                    bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
            {
                (filter_fields(ledger, filters))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
            }

            div class="w-full flex justify-between items-baseline mb-4"
            {
                h2 class="text-xl font-semibold"
                {
                    (match_count) " expenses, " (format_currency(total)) " in total"
                }

                p class="text-sm" { (dashboard_link) }
            }

            div class="w-full overflow-x-auto rounded-lg shadow"
            {
                table
                    id="transactions-table"
                    class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Team" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        }
                    }

                    tbody
                    {
                        @if expenses.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="5" class={(TABLE_CELL_STYLE) " text-center"}
                                {
                                    "No expenses match the selected filters."
                                }
                            }
                        }

                        @for expense in expenses {
                            (expense_row(expense))
                        }
                    }
                }
            }

            (pagination)
        }
    );

    base("Transactions", &[], &content)
}

fn expense_row(expense: &ExpenseRecord) -> Markup {
    let date = match expense.date {
        Some(date) => date.to_string(),
        None => "No date".to_owned(),
    };

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (date) }
            td class=(TABLE_CELL_STYLE) { (expense.team_id) }
            td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap"}
            {
                (format_currency(expense.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if !expense.category.is_empty() {
                    span class=(CATEGORY_BADGE_STYLE) { (expense.category) }
                }
                @if !expense.subcategory.is_empty() {
                    " "
                    span class="text-xs" { (expense.subcategory) }
                }
            }
            td class=(TABLE_CELL_STYLE) title=(expense.description)
            {
                (truncate_text(&expense.description, MAX_DESCRIPTION_GRAPHEMES))
            }
        }
    )
}
