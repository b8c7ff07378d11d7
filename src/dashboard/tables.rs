//! Table view of the rollup for the selected report.

use maud::{Markup, html};

use crate::{
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, format_percentage},
    rollup::{RollupResult, RollupTotals},
};

const TABLE_NUMBER_CELL_STYLE: &str = "text-right whitespace-nowrap";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Gets the CSS class for coloring amounts (green for positive, red for negative).
fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    }
}

/// Renders one row per team followed by a totals row.
pub(super) fn rollup_table(results: &[RollupResult], totals: &RollupTotals) -> Markup {
    html! {
        div class="w-full mb-6" {
            h3 class="text-xl font-semibold mb-4" { "Team Rollup" }

            div class="overflow-x-auto rounded-lg shadow" {
                table
                    id="rollup-table"
                    class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Team" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Available" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Spent" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Balance" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Utilization" }
                        }
                    }
                    tbody {
                        @if results.is_empty() {
                            tr class=(TABLE_ROW_STYLE) {
                                td colspan="5" class={(TABLE_CELL_STYLE) " text-center"} {
                                    "No teams match the selected filters."
                                }
                            }
                        }

                        @for result in results {
                            tr class=(TABLE_ROW_STYLE) {
                                th
                                    scope="row"
                                    class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
                                {
                                    (result.team_id)
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_currency(result.available_budget))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_currency(result.spent))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE) " " (amount_color_class(result.balance))} {
                                    (format_currency(result.balance))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_percentage(result.utilization_pct))
                                }
                            }
                        }
                    }
                    @if !results.is_empty() {
                        tfoot {
                            tr class="font-semibold text-gray-900 dark:text-white" {
                                th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_currency(totals.available_budget))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_currency(totals.spent))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE) " " (amount_color_class(totals.balance))} {
                                    (format_currency(totals.balance))
                                }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                    (format_percentage(totals.utilization_pct))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
