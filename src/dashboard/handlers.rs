//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and reloading its data
//! - HTML view functions for rendering the dashboard UI
//! - The page shown when the spreadsheet data cannot be loaded

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    dashboard::{
        aggregation::{monthly_spend, spend_by_category},
        cards::{metric_cards_view, team_progress_view},
        charts::{DashboardChart, budget_chart, category_chart, charts_view, monthly_spend_chart},
        tables::rollup_table,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, link, loading_spinner},
    ledger::Ledger,
    navigation::{NavBar, reload_button},
    report::{ReportFilters, ReportQuery, ReportState, filter_fields},
    rollup::{Period, PeriodSpan, RollupResult, RollupTotals, compute_rollup_filtered},
};

const ECHARTS_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The most load warnings listed on the dashboard, the rest are counted.
const MAX_LISTED_WARNINGS: usize = 10;

/// The state needed for displaying the dashboard page.
#[derive(Clone)]
pub struct DashboardState {
    /// The state shared by every report page.
    pub report: ReportState,
    /// Whether an AI summarizer is configured.
    pub summary_enabled: bool,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            report: ReportState::from_ref(state),
            summary_enabled: state.summarizer.is_some(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    period: Period,
    results: Vec<RollupResult>,
    totals: RollupTotals,
    charts: [DashboardChart; 3],
}

/// Display the budget rollup for the report selected by the query string.
///
/// htmx requests get only the dashboard content so that changing a filter
/// swaps the report in place.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    HxRequest(is_htmx_request): HxRequest,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let ledger = match state.report.ledger().await {
        Ok(ledger) => ledger,
        Err(error) if is_htmx_request => return Ok(error.into_alert_response()),
        Err(error) => return Err(error),
    };

    let filters = ReportFilters::from_query(&query);
    if let Some(team) = filters.team_id()
        && !ledger.has_team(team)
    {
        tracing::debug!("Team filter \"{team}\" matches no allocation row");
    }

    let data = build_dashboard_data(&ledger, &filters);
    let content = dashboard_content(&ledger, &filters, &data, state.summary_enabled);

    if is_htmx_request {
        return Ok(content.into_response());
    }

    Ok(dashboard_view(&content).into_response())
}

/// Drop the cached spreadsheet data and send the browser back to the dashboard.
pub async fn post_reload(State(state): State<ReportState>) -> Response {
    state.source.invalidate().await;

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::OK,
    )
        .into_response()
}

/// The page shown when the report cannot be built from the data source.
pub(crate) fn data_unavailable_response(error: &Error) -> Response {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            section
                id="data-unavailable"
                role="alert"
                class="w-full max-w-2xl p-6 rounded-lg border border-red-300
                    bg-red-50 text-red-800 dark:bg-gray-800 dark:text-red-400
                    dark:border-red-800"
            {
                h2 class="text-xl font-bold mb-2" { "Data unavailable" }

                p class="mb-4" { (error) }

                p class="mb-4 text-sm"
                {
                    "Check that the spreadsheet is published and reachable, then reload the data."
                }

                (reload_button())
            }
        }
    );

    (
        StatusCode::SERVICE_UNAVAILABLE,
        base("Data unavailable", &[], &content),
    )
        .into_response()
}

fn build_dashboard_data(ledger: &Ledger, filters: &ReportFilters) -> DashboardData {
    let period = filters.period(ledger.year);
    let results = compute_rollup_filtered(
        &ledger.allocations,
        &ledger.expenses,
        &filters.team,
        &period,
        &filters.classification,
    );
    let totals = RollupTotals::from_results(&results);

    let categories = spend_by_category(
        &ledger.allocations,
        &ledger.expenses,
        &filters.team,
        &period,
        &filters.classification,
    );
    let months = monthly_spend(
        &ledger.allocations,
        &ledger.expenses,
        &filters.team,
        ledger.year,
        &filters.classification,
    );

    let charts = [
        DashboardChart {
            id: "team-budget-chart",
            options: budget_chart(&results).to_string(),
        },
        DashboardChart {
            id: "spend-by-category-chart",
            options: category_chart(&categories).to_string(),
        },
        DashboardChart {
            id: "monthly-spend-chart",
            options: monthly_spend_chart(ledger.year, &months).to_string(),
        },
    ];

    DashboardData {
        period,
        results,
        totals,
        charts,
    }
}

fn period_label(period: &Period) -> String {
    match period.span {
        PeriodSpan::Cumulative => format!("{}, full year", period.year),
        PeriodSpan::Month(month) => format!("{month} {}", period.year),
    }
}

fn dashboard_view(content: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class=(PAGE_CONTAINER_STYLE)
        {
            (content)
        }
    );

    base(
        "Dashboard",
        &[HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned())],
        &content,
    )
}

/// The swappable part of the dashboard.
fn dashboard_content(
    ledger: &Ledger,
    filters: &ReportFilters,
    data: &DashboardData,
    summary_enabled: bool,
) -> Markup {
    let transactions_link = link(
        &filters.url(endpoints::TRANSACTIONS_VIEW, None),
        "the expenses behind this report",
    );

    html!(
        (filter_form(ledger, filters))

        div class="w-full flex justify-between items-baseline mb-4"
        {
            h2 class="text-2xl font-bold" { (period_label(&data.period)) }

            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "See " (transactions_link) "."
            }
        }

        (load_warnings_view(ledger))
        (metric_cards_view(&data.totals))
        (team_progress_view(&data.results))
        (charts_view(&data.charts))
        (rollup_table(&data.results, &data.totals))
        (summary_section(filters, summary_enabled))
    )
}

fn filter_form(ledger: &Ledger, filters: &ReportFilters) -> Markup {
    html!(
        form
            id="report-filters"
            hx-get=(endpoints::DASHBOARD_VIEW)
            hx-target="#dashboard-content"
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            hx-trigger="change"
            hx-push-url="true"
            class="w-full grid grid-cols-2 lg:grid-cols-4 gap-4 mb-6
                bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
        {
            (filter_fields(ledger, filters))
        }
    )
}

fn load_warnings_view(ledger: &Ledger) -> Markup {
    let warnings = &ledger.warnings;

    html!(
        @if !warnings.is_empty() {
            details
                id="load-warnings"
                class="w-full mb-6 p-4 rounded-lg border border-yellow-300
                    bg-yellow-50 text-yellow-800 dark:bg-gray-800
                    dark:text-yellow-300 dark:border-yellow-800"
            {
                summary class="cursor-pointer font-medium"
                {
                    (warnings.len())
                    @if warnings.len() == 1 { " value was" } @else { " values were" }
                    " skipped or read as zero while loading the spreadsheet"
                }

                ul class="mt-2 list-disc list-inside text-sm"
                {
                    @for warning in warnings.iter().take(MAX_LISTED_WARNINGS) {
                        li { (warning) }
                    }

                    @if warnings.len() > MAX_LISTED_WARNINGS {
                        li { "and " (warnings.len() - MAX_LISTED_WARNINGS) " more" }
                    }
                }
            }
        }
    )
}

fn summary_section(filters: &ReportFilters, summary_enabled: bool) -> Markup {
    let period = filters.span.to_string();

    html!(
        section id="summary-section" class="w-full mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "AI Summary" }

            @if summary_enabled {
                form
                    hx-post=(endpoints::SUMMARY_API)
                    hx-target="#summary"
                    hx-target-error="#summary"
                    hx-swap="innerHTML"
                    hx-disabled-elt="find button"
                    class="mb-4"
                {
                    input type="hidden" name="team" value=(filters.team_id().unwrap_or_default());
                    input type="hidden" name="period" value=(period);
                    input
                        type="hidden"
                        name="category"
                        value=(filters.classification.category.as_deref().unwrap_or_default());
                    input
                        type="hidden"
                        name="subcategory"
                        value=(filters.classification.subcategory.as_deref().unwrap_or_default());

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="htmx-indicator" { (loading_spinner()) }
                        "Summarize with AI"
                    }
                }

                div id="summary" {}
            } @else {
                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "AI summaries are turned off. Set GEMINI_API_KEY to turn them on."
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        extract::{FromRef, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Query;
    use axum_htmx::HxRequest;
    use scraper::{Html, Selector};

    use crate::{
        AppState, Error, endpoints,
        report::{ReportQuery, ReportState},
        summary::Summarizer,
        test_utils::{
            CountingSource, SAMPLE_YEAR, StubSummarizer, assert_content_type, assert_form_select,
            assert_hx_endpoint, assert_hx_redirect, assert_status_ok, assert_valid_html,
            must_get_form, parse_html_document, parse_html_fragment, sample_tables, test_state,
        },
    };

    use super::{DashboardState, get_dashboard_page, post_reload};

    fn sample_state() -> AppState {
        test_state(CountingSource::new(Ok(sample_tables())), None)
    }

    fn failing_state() -> AppState {
        test_state(
            CountingSource::new(Err(Error::DataSourceUnavailable(
                "allocations.csv".to_owned(),
                "connection refused".to_owned(),
            ))),
            None,
        )
    }

    async fn get_page(state: &AppState, query: ReportQuery) -> Html {
        let response = get_dashboard_page(
            State(DashboardState::from_ref(state)),
            HxRequest(false),
            Query(query),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    fn table_rows(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("#rollup-table tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect()
    }

    #[track_caller]
    fn assert_element_exists(html: &Html, selector: &str) {
        assert!(
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .is_some(),
            "No element matches {selector}"
        );
    }

    #[tokio::test]
    async fn dashboard_page_loads_successfully() {
        let html = get_page(&sample_state(), ReportQuery::default()).await;

        assert_element_exists(&html, "nav");
        assert_element_exists(&html, "#metrics");
        assert_element_exists(&html, "#team-progress");
        assert_element_exists(&html, "#team-budget-chart");
        assert_element_exists(&html, "#spend-by-category-chart");
        assert_element_exists(&html, "#monthly-spend-chart");

        let rows = table_rows(&html);
        assert_eq!(rows.len(), 2, "Idle should be hidden, got {rows:?}");
        assert!(rows[0].contains("Production"));
        assert!(rows[1].contains("Quality"));
    }

    #[tokio::test]
    async fn filter_form_lists_teams_periods_and_categories() {
        let html = get_page(&sample_state(), ReportQuery::default()).await;

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::DASHBOARD_VIEW, "hx-get");
        assert_form_select(&form, "team", &["", "Production", "Quality", "Idle"], "");
        assert_form_select(
            &form,
            "period",
            &[
                "cumulative", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            ],
            "cumulative",
        );
        assert_form_select(
            &form,
            "category",
            &["", "Equipment", "Supplies", "Travel"],
            "",
        );
    }

    #[tokio::test]
    async fn month_filter_shows_carried_budget() {
        let html = get_page(
            &sample_state(),
            ReportQuery {
                period: Some("3".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let rows = table_rows(&html);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("156.3%"), "got {}", rows[0]);

        let form = must_get_form(&html);
        assert_form_select(
            &form,
            "period",
            &[
                "cumulative", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
            ],
            "3",
        );
    }

    #[tokio::test]
    async fn category_filter_limits_subcategories_and_teams() {
        let html = get_page(
            &sample_state(),
            ReportQuery {
                category: Some("Equipment".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let rows = table_rows(&html);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("Production"));

        let form = must_get_form(&html);
        assert_form_select(&form, "category", &["", "Equipment", "Supplies", "Travel"], "Equipment");
        assert_form_select(&form, "subcategory", &["", "Tools"], "");
    }

    #[tokio::test]
    async fn unknown_team_shows_empty_report() {
        let html = get_page(
            &sample_state(),
            ReportQuery {
                team: Some("Marketing".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let rows = table_rows(&html);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("No teams match"));
    }

    #[tokio::test]
    async fn shows_load_warnings() {
        let html = get_page(&sample_state(), ReportQuery::default()).await;

        let warnings = html
            .select(&Selector::parse("#load-warnings li").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn htmx_request_gets_content_only() {
        let state = sample_state();

        let response = get_dashboard_page(
            State(DashboardState::from_ref(&state)),
            HxRequest(true),
            Query(ReportQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert!(html.select(&Selector::parse("nav").unwrap()).next().is_none());
        assert_element_exists(&html, "#metrics");
        assert_element_exists(&html, "#report-filters");
    }

    #[tokio::test]
    async fn summary_button_hidden_without_summarizer() {
        let html = get_page(&sample_state(), ReportQuery::default()).await;

        let summary_forms = html
            .select(&Selector::parse("form[hx-post='/api/summary']").unwrap())
            .count();
        assert_eq!(summary_forms, 0);
        assert_element_exists(&html, "#summary-section");
    }

    #[tokio::test]
    async fn summary_form_carries_filters() {
        let summarizer: Arc<dyn Summarizer> = Arc::new(StubSummarizer::new(Ok(String::new())));
        let state = test_state(CountingSource::new(Ok(sample_tables())), Some(summarizer));

        let html = get_page(
            &state,
            ReportQuery {
                team: Some("Quality".to_owned()),
                period: Some("3".to_owned()),
                ..Default::default()
            },
        )
        .await;

        let form = html
            .select(&Selector::parse("form[hx-post='/api/summary']").unwrap())
            .next()
            .expect("No summary form found");
        assert_hx_endpoint(&form, "#summary", "hx-target");
        let hidden_value = |name: &str| {
            form.select(&Selector::parse(&format!("input[name='{name}']")).unwrap())
                .next()
                .and_then(|input| input.value().attr("value"))
                .map(str::to_owned)
        };
        assert_eq!(hidden_value("team"), Some("Quality".to_owned()));
        assert_eq!(hidden_value("period"), Some("3".to_owned()));
        assert_eq!(hidden_value("category"), Some(String::new()));
        assert_element_exists(&html, "#summary");
    }

    #[tokio::test]
    async fn source_failure_renders_unavailable_page() {
        let state = failing_state();

        let error = get_dashboard_page(
            State(DashboardState::from_ref(&state)),
            HxRequest(false),
            Query(ReportQuery::default()),
        )
        .await
        .unwrap_err();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let banner = html
            .select(&Selector::parse("#data-unavailable").unwrap())
            .next()
            .expect("No error banner found");
        assert!(banner.text().collect::<String>().contains("connection refused"));
        assert!(
            banner
                .select(&Selector::parse("button[hx-post='/api/reload']").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn source_failure_on_htmx_request_is_an_alert() {
        let state = failing_state();

        let response = get_dashboard_page(
            State(DashboardState::from_ref(&state)),
            HxRequest(true),
            Query(ReportQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = parse_html_fragment(response).await;
        assert_element_exists(&html, "div[role=alert]");
    }

    #[tokio::test]
    async fn reload_drops_cache_and_redirects() {
        let source = Arc::new(CountingSource::new(Ok(sample_tables())));
        let state = AppState::new(
            source.clone(),
            std::time::Duration::from_secs(60),
            Default::default(),
            None,
            Some(SAMPLE_YEAR),
            "Etc/UTC",
            Default::default(),
        )
        .unwrap();
        let report = ReportState::from_ref(&state);

        report.ledger().await.unwrap();
        report.ledger().await.unwrap();
        assert_eq!(source.fetch_count(), 1);

        let response = post_reload(State(report.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        report.ledger().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }
}
