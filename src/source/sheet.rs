use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::{
    Error,
    config::SourceConfig,
    source::{
        DataSource, SourceLocation, SourceTables, Table,
        decode::{decode_csv, read_workbook},
    },
};

/// Reads the tables from the locations in a [SourceConfig].
#[derive(Debug, Clone)]
pub struct SheetSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl SheetSource {
    /// Create a source that gives up on HTTP requests after `fetch_timeout`.
    ///
    /// # Errors
    /// Returns [Error::DataSourceUnavailable] if the HTTP client cannot be created.
    pub fn new(config: SourceConfig, fetch_timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|error| {
                Error::DataSourceUnavailable("HTTP client".to_owned(), error.to_string())
            })?;

        Ok(Self { config, client })
    }

    async fn fetch_table(&self, location: &SourceLocation) -> Result<Table, Error> {
        match location {
            SourceLocation::Url(url) => self.fetch_url(url).await,
            SourceLocation::File { path, sheet } if SourceLocation::is_workbook(path) => {
                let path = path.clone();
                let sheet = sheet.clone();

                tokio::task::spawn_blocking(move || read_workbook(&path, sheet.as_deref()))
                    .await
                    .map_err(|error| {
                        Error::DataSourceUnavailable(location.to_string(), error.to_string())
                    })?
            }
            SourceLocation::File { path, .. } => {
                let bytes = tokio::fs::read(path).await.map_err(|error| {
                    Error::DataSourceUnavailable(location.to_string(), error.to_string())
                })?;

                decode_csv(&location.to_string(), &bytes)
            }
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<Table, Error> {
        let unavailable = |reason: String| Error::DataSourceUnavailable(url.to_owned(), reason);

        tracing::debug!("Fetching sheet from {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| unavailable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("the server responded with {status}")));
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"));

        if is_html {
            return Err(Error::InvalidTable(
                url.to_owned(),
                "expected CSV but got an HTML page, check that the sheet is published as CSV"
                    .to_owned(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| unavailable(error.to_string()))?;

        decode_csv(url, &bytes)
    }
}

#[async_trait]
impl DataSource for SheetSource {
    async fn fetch_tables(&self) -> Result<SourceTables, Error> {
        let (allocations, expenses) = tokio::try_join!(
            self.fetch_table(&self.config.allocations),
            self.fetch_table(&self.config.expenses)
        )
        .inspect_err(|error| tracing::error!("Could not fetch source tables: {error}"))?;

        tracing::info!(
            "Fetched {} allocation rows and {} expense rows",
            allocations.rows.len(),
            expenses.rows.len()
        );

        Ok(SourceTables {
            allocations,
            expenses,
        })
    }
}
