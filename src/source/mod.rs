//! Reading the allocation and expense tables from a spreadsheet.
//!
//! A [DataSource] fetches both tables as rows of strings. [SheetSource] reads
//! them from published Google Sheets (CSV export URLs), local CSV files or
//! local workbooks, and [CachedSource] memoizes the fetch for a short time so
//! that page loads do not hammer the spreadsheet export endpoint.

mod cache;
mod decode;
mod location;
mod sheet;

use async_trait::async_trait;

pub use cache::CachedSource;
pub use location::SourceLocation;
pub use sheet::SheetSource;

use crate::Error;

/// A table as read from a spreadsheet: a header row followed by data rows.
///
/// Cells are trimmed strings. Rows may be shorter or longer than the header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// A human readable name for where the table came from.
    pub name: String,
    /// The column names from the first row of the sheet.
    pub headers: Vec<String>,
    /// The remaining rows of the sheet, blank rows removed.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Get the cell in `row` at `column`, or an empty string if the row is too short.
    pub fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

/// The two tables the rollup needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTables {
    /// One row per team with the monthly base and supplemental allocations.
    pub allocations: Table,
    /// One row per expense transaction.
    pub expenses: Table,
}

/// Something that can fetch the allocation and expense tables.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch all sheets as tables.
    ///
    /// # Errors
    /// Returns an error if either table cannot be fetched or decoded.
    async fn fetch_tables(&self) -> Result<SourceTables, Error>;
}
