//! Report filters shared by the dashboard, transaction list and summary.

use std::sync::Arc;

use axum::extract::FromRef;
use maud::{Markup, html};
use serde::Deserialize;
use time::Month;

use crate::{
    AppState, Error,
    html::{FORM_LABEL_STYLE, FORM_SELECT_STYLE},
    ledger::{Ledger, SchemaConfig},
    rollup::{ClassificationFilter, Period, PeriodSpan, TeamFilter},
    source::CachedSource,
    timezone::current_year,
};

/// The query parameters that select a report.
///
/// Every field is optional and an empty string means the same as a missing
/// value, which is what an HTML select with an "All" option submits. Extract
/// it with `axum_extra`'s `Query` so that `page=` is read as no page.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
pub struct ReportQuery {
    #[serde(default)]
    pub team: Option<String>,
    /// `cumulative` or a month number from 1 to 12.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    /// The page of the transaction list to show.
    #[serde(default)]
    pub page: Option<u64>,
}

/// The validated filters for a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub team: TeamFilter,
    pub span: PeriodSpan,
    pub classification: ClassificationFilter,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl ReportFilters {
    /// Read the filters from the query string.
    ///
    /// An unreadable period falls back to the cumulative view.
    pub fn from_query(query: &ReportQuery) -> Self {
        let team = match non_empty(&query.team) {
            Some(team) => TeamFilter::Team(team),
            None => TeamFilter::All,
        };

        let span = match non_empty(&query.period) {
            Some(period) => period.parse().unwrap_or_else(|error| {
                tracing::debug!("Ignoring period filter: {error}");
                PeriodSpan::Cumulative
            }),
            None => PeriodSpan::Cumulative,
        };

        Self {
            team,
            span,
            classification: ClassificationFilter {
                category: non_empty(&query.category),
                subcategory: non_empty(&query.subcategory),
            },
        }
    }

    pub fn period(&self, year: i32) -> Period {
        Period {
            year,
            span: self.span,
        }
    }

    /// The team id if a single team is selected.
    pub fn team_id(&self) -> Option<&str> {
        match &self.team {
            TeamFilter::All => None,
            TeamFilter::Team(team) => Some(team),
        }
    }

    /// Encode the filters as a query string, leaving out defaults.
    pub fn to_query_string(&self, page: Option<u64>) -> String {
        let period = match self.span {
            PeriodSpan::Cumulative => None,
            span => Some(span.to_string()),
        };

        let pairs = [
            ("team", self.team_id().map(str::to_owned)),
            ("period", period),
            ("category", self.classification.category.clone()),
            ("subcategory", self.classification.subcategory.clone()),
            ("page", page.map(|page| page.to_string())),
        ];
        let pairs = pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect::<Vec<_>>();

        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }

    /// A link to `endpoint` with these filters applied.
    pub fn url(&self, endpoint: &str, page: Option<u64>) -> String {
        match self.to_query_string(page) {
            query if query.is_empty() => endpoint.to_owned(),
            query => format!("{endpoint}?{query}"),
        }
    }
}

fn select_option(value: &str, label: &str, selected: &str) -> Markup {
    html!(
        option value=(value) selected[value == selected] { (label) }
    )
}

/// The team, period, category and subcategory selects for `filters`.
///
/// The options come from `ledger` and the current filters are selected. The
/// subcategories are limited to the selected category.
pub fn filter_fields(ledger: &Ledger, filters: &ReportFilters) -> Markup {
    let selected_team = filters.team_id().unwrap_or_default();
    let selected_period = filters.span.to_string();
    let selected_category = filters.classification.category.as_deref();
    let selected_subcategory = filters
        .classification
        .subcategory
        .as_deref()
        .unwrap_or_default();
    let categories = ledger.categories();
    let subcategories = ledger.subcategories(selected_category);
    let selected_category = selected_category.unwrap_or_default();

    html!(
        div
        {
            label for="team" class=(FORM_LABEL_STYLE) { "Team" }
            select id="team" name="team" class=(FORM_SELECT_STYLE)
            {
                (select_option("", "All teams", selected_team))

                @for team in ledger.teams() {
                    (select_option(team, team, selected_team))
                }
            }
        }

        div
        {
            label for="period" class=(FORM_LABEL_STYLE) { "Period" }
            select id="period" name="period" class=(FORM_SELECT_STYLE)
            {
                (select_option("cumulative", "Full year", &selected_period))

                @for number in 1..=12u8 {
                    @if let Ok(month) = Month::try_from(number) {
                        (select_option(&number.to_string(), &month.to_string(), &selected_period))
                    }
                }
            }
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }
            select id="category" name="category" class=(FORM_SELECT_STYLE)
            {
                (select_option("", "All categories", selected_category))

                @for category in &categories {
                    (select_option(category, category, selected_category))
                }
            }
        }

        div
        {
            label for="subcategory" class=(FORM_LABEL_STYLE) { "Subcategory" }
            select id="subcategory" name="subcategory" class=(FORM_SELECT_STYLE)
            {
                (select_option("", "All subcategories", selected_subcategory))

                @for subcategory in &subcategories {
                    (select_option(subcategory, subcategory, selected_subcategory))
                }
            }
        }
    )
}

/// The state needed to build a report.
#[derive(Clone)]
pub struct ReportState {
    pub source: Arc<CachedSource>,
    pub schema: Arc<SchemaConfig>,
    /// The configured report year, `None` for the current year.
    pub year: Option<i32>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            source: state.source.clone(),
            schema: state.schema.clone(),
            year: state.year,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl ReportState {
    /// The year to report on.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if no year is configured and the
    /// local timezone is invalid.
    pub fn report_year(&self) -> Result<i32, Error> {
        match self.year {
            Some(year) => Ok(year),
            None => current_year(&self.local_timezone).ok_or_else(|| {
                tracing::error!("Invalid timezone {}", self.local_timezone);
                Error::InvalidTimezoneError(self.local_timezone.clone())
            }),
        }
    }

    /// Fetch the tables (from the cache if fresh) and build the ledger.
    ///
    /// # Errors
    /// Returns an error if the tables cannot be fetched or have no team column.
    pub async fn ledger(&self) -> Result<Ledger, Error> {
        let year = self.report_year()?;
        let tables = self
            .source
            .get()
            .await
            .inspect_err(|error| tracing::error!("Could not fetch source tables: {error}"))?;

        Ledger::load(&tables, &self.schema, year)
    }
}
