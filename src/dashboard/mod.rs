//! Dashboard module
//!
//! Provides the budget rollup page with metric cards, charts and a team table.
//! The report can be filtered by team, period, category and subcategory.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub(crate) use handlers::data_unavailable_response;
pub use handlers::{get_dashboard_page, post_reload};
