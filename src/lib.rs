//! Budget Rollup is a web dashboard for tracking team budgets against spending.
//!
//! Allocations and expenses are read from a published spreadsheet, rolled up
//! per team for a reporting period and served as HTML pages. The rolled-up
//! table can optionally be summarized by a generative-AI service.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod config;
mod dashboard;
mod endpoints;
mod html;
mod internal_server_error;
mod ledger;
mod navigation;
mod not_found;
mod pagination;
mod report;
mod rollup;
mod routing;
mod sheets;
mod source;
mod summary;
mod timezone;
mod transactions;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{ColumnPin, SourceConfig};
pub use pagination::PaginationConfig;
pub use ledger::{AllocationRecord, ExpenseRecord, Ledger, LoadWarning, SchemaConfig};
pub use rollup::{
    ClassificationFilter, Period, PeriodSpan, RollupResult, RollupTotals, TeamFilter,
    compute_rollup, compute_rollup_filtered,
};
pub use routing::build_router;
pub use source::{CachedSource, DataSource, SheetSource, SourceLocation, SourceTables, Table};
pub use summary::{GeminiClient, RetryPolicy, Summarizer};
pub use timezone::get_local_offset;

use crate::{
    alert::Alert, internal_server_error::InternalServerError, not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The spreadsheet could not be fetched or read.
    ///
    /// Callers should pass in a description of the source and the underlying
    /// error as a string.
    #[error("could not read data source {0}: {1}")]
    DataSourceUnavailable(String, String),

    /// The fetched data could not be decoded as a table.
    #[error("could not parse table {0}: {1}")]
    InvalidTable(String, String),

    /// A column that every row depends on could not be found in a table.
    #[error("the {table} table has no {column} column")]
    MissingColumn {
        /// The logical name of the table, e.g. "allocations".
        table: &'static str,
        /// The logical name of the column, e.g. "team".
        column: &'static str,
    },

    /// A workbook was opened but the configured sheet is not in it.
    #[error("sheet \"{sheet}\" not found, available sheets: {available}")]
    SheetNotFound {
        /// The configured sheet name.
        sheet: String,
        /// A comma separated list of the sheets in the workbook.
        available: String,
    },

    /// A source location given on the command line is not a URL or a readable file.
    #[error("invalid source location \"{0}\": {1}")]
    InvalidSourceLocation(String, String),

    /// A column mapping given on the command line is not of the form `field=header`.
    #[error("invalid column mapping \"{0}\": {1}")]
    InvalidColumnMapping(String, String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The AI summarization service failed or returned no text.
    #[error("summary request failed: {0}")]
    SummaryFailed(String),

    /// A summary was requested but no API key was configured.
    #[error("the summarization service is not configured")]
    SummarizerNotConfigured,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,
}

impl Error {
    /// Whether this error means the report has no data to work with.
    fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            Error::DataSourceUnavailable(..)
                | Error::InvalidTable(..)
                | Error::MissingColumn { .. }
                | Error::SheetNotFound { .. }
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            error if error.is_data_unavailable() => {
                tracing::error!("Data source unavailable: {error}");
                dashboard::data_unavailable_response(&error)
            }
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::SummarizerNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "AI summary unavailable".to_owned(),
                    details: "Set the GEMINI_API_KEY environment variable and restart the \
                        server to enable AI summaries."
                        .to_owned(),
                },
            ),
            Error::SummaryFailed(reason) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Could not create summary".to_owned(),
                    details: format!("The AI service did not return a summary: {reason}"),
                },
            ),
            error if error.is_data_unavailable() => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "Data unavailable".to_owned(),
                    details: format!("{error}. Try reloading the data."),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: "An unexpected error occurred, check the server logs for more \
                            details."
                            .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
