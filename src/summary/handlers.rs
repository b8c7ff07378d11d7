use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};

use crate::{
    AppState, Error,
    report::{ReportFilters, ReportQuery, ReportState},
    rollup::compute_rollup_filtered,
    summary::{Summarizer, build_prompt, render_rollup_text},
};

/// The state needed to summarize a report.
#[derive(Clone)]
pub struct SummaryState {
    pub report: ReportState,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            report: ReportState::from_ref(state),
            summarizer: state.summarizer.clone(),
        }
    }
}

/// Summarize the report selected by the dashboard filters.
///
/// Responds with an HTML fragment for the summary slot, or an alert if the
/// summary could not be created.
pub async fn post_summary(
    State(state): State<SummaryState>,
    Form(query): Form<ReportQuery>,
) -> Response {
    let Some(summarizer) = state.summarizer else {
        return Error::SummarizerNotConfigured.into_alert_response();
    };

    let ledger = match state.report.ledger().await {
        Ok(ledger) => ledger,
        Err(error) => return error.into_alert_response(),
    };

    let filters = ReportFilters::from_query(&query);
    let period = filters.period(ledger.year);
    let results = compute_rollup_filtered(
        &ledger.allocations,
        &ledger.expenses,
        &filters.team,
        &period,
        &filters.classification,
    );
    let prompt = build_prompt(&render_rollup_text(&results, &period));

    tracing::info!("Requesting a summary of {} teams", results.len());

    match summarizer.summarize(&prompt).await {
        Ok(summary) => summary_view(&summary).into_response(),
        Err(error) => {
            tracing::error!("Could not summarize report: {error}");
            error.into_alert_response()
        }
    }
}

fn summary_view(summary: &str) -> Markup {
    html!(
        article
            id="summary-result"
            class="w-full p-4 rounded-lg bg-white dark:bg-gray-800 shadow"
        {
            h3 class="text-lg font-semibold mb-2" { "AI summary" }

            div class="whitespace-pre-line text-sm text-gray-700 dark:text-gray-300"
            {
                (summary)
            }
        }
    )
}
