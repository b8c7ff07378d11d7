//! Implements a struct that holds the state of the web server.

use std::{sync::Arc, time::Duration};

use crate::{
    Error,
    ledger::SchemaConfig,
    pagination::PaginationConfig,
    source::{CachedSource, DataSource},
    summary::Summarizer,
    timezone::get_local_offset,
};

/// The state of the web server.
#[derive(Clone)]
pub struct AppState {
    /// The spreadsheet tables, memoized for a short time.
    pub source: Arc<CachedSource>,

    /// How spreadsheet headers map to record fields.
    pub schema: Arc<SchemaConfig>,

    /// The AI service used to summarize reports, if one is configured.
    pub summarizer: Option<Arc<dyn Summarizer>>,

    /// The year to report on, or `None` to use the current year.
    pub year: Option<i32>,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] that caches the tables from `source` for `cache_ttl`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Seoul".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone.
    pub fn new(
        source: Arc<dyn DataSource>,
        cache_ttl: Duration,
        schema: SchemaConfig,
        summarizer: Option<Arc<dyn Summarizer>>,
        year: Option<i32>,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            source: Arc::new(CachedSource::new(source, cache_ttl)),
            schema: Arc::new(schema),
            summarizer,
            year,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
        })
    }
}
