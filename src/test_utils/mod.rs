#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    AppState, Error,
    ledger::SchemaConfig,
    pagination::PaginationConfig,
    source::{DataSource, SourceTables, Table},
    summary::Summarizer,
};

pub(crate) use form::{assert_form_select, assert_hx_endpoint, must_get_form};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok};

/// The year the sample tables are for.
pub(crate) const SAMPLE_YEAR: i32 = 2024;

fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
    Table {
        name: name.to_owned(),
        headers: headers.iter().map(|header| header.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    }
}

/// Three teams and a handful of expenses in [SAMPLE_YEAR].
///
/// Production overspends in March, Quality has a supplemental allocation in
/// March, and Idle has nothing allocated and nothing spent.
pub(crate) fn sample_tables() -> SourceTables {
    SourceTables {
        allocations: table(
            "allocations",
            &["팀", "월 기본예산", "3월 추가예산"],
            &[
                &["Production", "1,000,000", ""],
                &["Quality", "500,000", "200,000"],
                &["Idle", "0", ""],
            ],
        ),
        expenses: table(
            "expenses",
            &["날짜", "팀", "금액", "항목", "세부항목", "적요"],
            &[
                &["2024-01-15", "Production", "300,000", "Travel", "Taxi", "Airport run"],
                &["2024-02-03", "Production", "400,000", "Supplies", "Paper", "Printer paper"],
                &["2024-03-10", "Production", "2,500,000", "Equipment", "Tools", "Lathe"],
                &["2024-03-12", "Quality", "150,000", "Travel", "Train", "Site visit"],
                &["2023-12-30", "Quality", "999,000", "Travel", "Taxi", "Last year"],
                &["someday", "Quality", "10,000", "Supplies", "Paper", "Undated"],
            ],
        ),
    }
}

/// A [DataSource] that always returns the same result and counts its fetches.
pub(crate) struct CountingSource {
    result: Result<SourceTables, Error>,
    fetch_count: AtomicUsize,
}

impl CountingSource {
    pub(crate) fn new(result: Result<SourceTables, Error>) -> Self {
        Self {
            result,
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for CountingSource {
    async fn fetch_tables(&self) -> Result<SourceTables, Error> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// A [Summarizer] that returns a canned reply and records the prompts it was given.
pub(crate) struct StubSummarizer {
    reply: Result<String, Error>,
    prompts: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub(crate) fn new(reply: Result<String, Error>) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, Error> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.reply.clone()
    }
}

/// App state reporting on [SAMPLE_YEAR] from `source`.
pub(crate) fn test_state(
    source: CountingSource,
    summarizer: Option<Arc<dyn Summarizer>>,
) -> AppState {
    AppState::new(
        Arc::new(source),
        Duration::from_secs(60),
        SchemaConfig::default(),
        summarizer,
        Some(SAMPLE_YEAR),
        "Etc/UTC",
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
}
