//! Card components for the selected report.
//!
//! Provides:
//! - Metric cards with the totals across the shown teams
//! - A progress row per team showing how much of its budget is used

use maud::{Markup, html};

use crate::{
    html::{format_currency, format_percentage},
    rollup::{RollupResult, RollupTotals},
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";
const TEXT_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Renders the four headline metrics for the shown teams.
pub(super) fn metric_cards_view(totals: &RollupTotals) -> Markup {
    let balance_style = if totals.balance < 0.0 {
        TEXT_RED_STYLE
    } else {
        ""
    };
    let utilization_style = if totals.utilization_pct > 100.0 {
        TEXT_RED_STYLE
    } else {
        ""
    };

    html! {
        section
            id="metrics"
            class="w-full grid grid-cols-2 lg:grid-cols-4 gap-4 mb-6"
        {
            (metric_card("Available budget", &format_currency(totals.available_budget), ""))
            (metric_card("Spent", &format_currency(totals.spent), ""))
            (metric_card("Balance", &format_currency(totals.balance), balance_style))
            (metric_card("Utilization", &format_percentage(totals.utilization_pct), utilization_style))
        }
    }
}

fn metric_card(label: &str, value: &str, value_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-metric=(label) {
            div class="text-sm text-gray-600 dark:text-gray-400 mb-1" { (label) }
            div class={"text-2xl font-bold " (value_style)} { (value) }
        }
    }
}

/// Renders a budget progress row for each team.
pub(super) fn team_progress_view(results: &[RollupResult]) -> Markup {
    html! {
        section id="team-progress" class="w-full mb-6" {
            h3 class="text-xl font-semibold mb-4" { "Budget used" }

            @if results.is_empty() {
                p class="text-gray-600 dark:text-gray-400" {
                    "No teams match the selected filters."
                }
            } @else {
                div class={(CARD_STYLE) " space-y-4"} {
                    @for result in results {
                        (team_progress_row(result))
                    }
                }
            }
        }
    }
}

fn team_progress_row(result: &RollupResult) -> Markup {
    let amount_style = if result.utilization_pct > 100.0 {
        TEXT_RED_STYLE
    } else {
        ""
    };

    html! {
        div data-team=(result.team_id) {
            div class="flex justify-between items-baseline mb-1" {
                span class="font-medium truncate" title=(result.team_id) {
                    (result.team_id)
                }
                span class={"text-sm " (amount_style)} {
                    (format_currency(result.spent)) " / "
                    (format_currency(result.available_budget))
                    " (" (format_percentage(result.utilization_pct)) ")"
                }
            }

            (progress_bar(result.utilization_pct))
        }
    }
}

/// Renders a horizontal progress bar for a utilization percentage.
///
/// The bar is clamped to 0-100% and turns red once the budget is exceeded.
fn progress_bar(percentage: f64) -> Markup {
    let clamped = percentage.clamp(0.0, 100.0);

    // Ensure minimum 3% width so rounded corners are visible
    let display_percentage = if clamped > 0.0 && clamped < 3.0 {
        3.0
    } else {
        clamped
    };

    let bar_colour = if percentage > 100.0 {
        "bg-red-600 dark:bg-red-500"
    } else {
        "bg-blue-600 dark:bg-blue-500"
    };

    html! {
        div
            class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5"
            role="progressbar"
            aria-valuenow=(format!("{clamped:.0}"))
            aria-valuemin="0"
            aria-valuemax="100"
        {
            @if clamped > 0.0 {
                div
                    class={(bar_colour) " h-2.5 rounded-full transition-all"}
                    style=(format!("width: {:.1}%", display_percentage))
                {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        html::format_currency,
        rollup::{RollupResult, RollupTotals},
    };

    use super::{metric_cards_view, progress_bar, team_progress_view};

    fn result(team_id: &str, available_budget: f64, spent: f64, utilization_pct: f64) -> RollupResult {
        RollupResult {
            team_id: team_id.to_owned(),
            available_budget,
            spent,
            balance: available_budget - spent,
            utilization_pct,
        }
    }

    #[test]
    fn metric_cards_show_totals() {
        let totals = RollupTotals {
            available_budget: 2_800_000.0,
            spent: 2_650_000.0,
            balance: 150_000.0,
            utilization_pct: 94.64,
        };

        let html = metric_cards_view(&totals).into_string();

        assert!(html.contains(&format_currency(2_800_000.0)));
        assert!(html.contains(&format_currency(2_650_000.0)));
        assert!(html.contains(&format_currency(150_000.0)));
        assert!(html.contains("94.6%"));
        assert!(!html.contains("text-red-600"));
    }

    #[test]
    fn negative_balance_is_highlighted() {
        let totals = RollupTotals {
            available_budget: 100.0,
            spent: 150.0,
            balance: -50.0,
            utilization_pct: 150.0,
        };

        let html = metric_cards_view(&totals).into_string();

        assert!(html.contains("text-red-600"));
    }

    #[test]
    fn progress_row_shows_unclamped_utilization() {
        let html =
            team_progress_view(&[result("Production", 1_600_000.0, 2_500_000.0, 156.25)])
                .into_string();

        assert!(html.contains("Production"));
        assert!(html.contains("156.3%"));
        assert!(html.contains("width: 100.0%"));
        assert!(html.contains("bg-red-600"));
    }

    #[test]
    fn progress_view_explains_when_no_teams_match() {
        let html = team_progress_view(&[]).into_string();

        assert!(html.contains("No teams match"));
    }

    #[test]
    fn progress_bar_has_minimum_width_for_small_percentages() {
        let html = progress_bar(0.5).into_string();
        // Should render with 3% width (minimum for rounded corners to show)
        assert!(html.contains("width: 3.0%"));
    }

    #[test]
    fn progress_bar_empty_for_zero_percentage() {
        let html = progress_bar(0.0).into_string();

        assert!(html.contains("progressbar"));
        assert!(!html.contains("bg-blue-600"));
    }

    #[test]
    fn progress_bar_clamps_negative_values() {
        let html = progress_bar(-5.0).into_string();

        assert!(html.contains("aria-valuenow=\"0\""));
        assert!(!html.contains("width:"));
    }

    #[test]
    fn progress_bar_within_budget_is_blue() {
        let html = progress_bar(40.0).into_string();

        assert!(html.contains("width: 40.0%"));
        assert!(html.contains("bg-blue-600"));
    }
}
