//! The endpoint URIs.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The budget rollup dashboard.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing the expense records behind the dashboard.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page showing the raw allocation and expense tables.
pub const SHEETS_VIEW: &str = "/sheets";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route that drops the cached spreadsheet data.
pub const RELOAD_API: &str = "/api/reload";
/// The route that asks the AI service to summarize the current report.
pub const SUMMARY_API: &str = "/api/summary";
