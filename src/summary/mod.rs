//! Natural-language summaries of a rollup from a generative-AI service.
//!
//! The rolled-up table is flattened to fixed-width text and appended to a
//! fixed instruction prompt. The service is only consulted on request and a
//! failure only affects the summary slot of the dashboard.

mod gemini;
mod handlers;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

pub use gemini::{GeminiClient, RetryPolicy};
pub use handlers::post_summary;

use crate::{
    Error,
    rollup::{Period, PeriodSpan, RollupResult},
};

/// The instruction sent ahead of the table: "You are a factory management
/// expert. Look at the following data and summarize which teams need to cut
/// costs and what to watch out for."
const INSTRUCTION: &str = "너는 공장 경영관리 전문가야. \
    다음 데이터를 보고 비용 절감이 필요한 팀이나 주의할 점을 요약해줘:";

/// Something that turns a prompt into a written summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Ask for a summary.
    ///
    /// # Errors
    /// Returns [Error::SummaryFailed] if the service fails or returns no text.
    async fn summarize(&self, prompt: &str) -> Result<String, Error>;
}

/// The prompt for summarizing `table_text`.
pub fn build_prompt(table_text: &str) -> String {
    format!("{INSTRUCTION}\n\n{table_text}")
}

const HEADERS: [&str; 5] = [
    "team",
    "available_budget",
    "spent",
    "balance",
    "utilization_pct",
];

/// Flatten `results` into a fixed-width text table headed by the period.
///
/// The team column is left aligned and padded by grapheme count; the numeric
/// columns are right aligned.
pub fn render_rollup_text(results: &[RollupResult], period: &Period) -> String {
    let period_label = match period.span {
        PeriodSpan::Cumulative => format!("{} cumulative", period.year),
        PeriodSpan::Month(month) => format!("{}-{:02}", period.year, u8::from(month)),
    };

    let rows = results
        .iter()
        .map(|result| {
            [
                result.team_id.clone(),
                format!("{:.0}", result.available_budget),
                format!("{:.0}", result.spent),
                format!("{:.0}", result.balance),
                format!("{:.1}", result.utilization_pct),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = HEADERS.map(width);
    for row in &rows {
        for (column, cell) in row.iter().enumerate() {
            widths[column] = widths[column].max(width(cell));
        }
    }

    let mut lines = vec![format!("period: {period_label}")];
    lines.push(format_row(HEADERS.map(str::to_owned).as_slice(), &widths));
    lines.extend(rows.iter().map(|row| format_row(row, &widths)));

    if rows.is_empty() {
        lines.push("(no teams match the filters)".to_owned());
    }

    lines.join("\n")
}

fn width(text: &str) -> usize {
    text.graphemes(true).count()
}

fn format_row(cells: &[String], widths: &[usize; 5]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(column, (cell, &column_width))| {
            let padding = " ".repeat(column_width - width(cell));

            if column == 0 {
                format!("{cell}{padding}")
            } else {
                format!("{padding}{cell}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}
