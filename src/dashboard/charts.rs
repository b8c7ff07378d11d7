//! Chart generation and rendering for the dashboard.
//!
//! Creates ECharts visualizations of the selected report:
//! - **Budget vs Spent**: Available budget and spending side by side per team
//! - **Spending by Category**: Share of spending per expense category
//! - **Monthly Spending**: Spending in each month of the report year
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with a HTML container and an inline initialization script. The
//! script sits next to the containers so that it runs again when htmx swaps
//! in new dashboard content.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Line, Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::rollup::RollupResult;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the chart containers followed by their initialization script.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }

            (charts_script(charts))
        }
    )
}

/// Generates the JavaScript that initializes the dashboard charts.
///
/// Each chart follows the browser's dark mode setting and resizes with the
/// window.
fn charts_script(charts: &[DashboardChart]) -> Markup {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom || typeof echarts === "undefined") return;
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', () => chart.resize());

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    html!(
        script { (PreEscaped(script_content)) }
    )
}

pub(super) fn budget_chart(results: &[RollupResult]) -> Chart {
    let labels = results
        .iter()
        .map(|result| result.team_id.clone())
        .collect::<Vec<_>>();
    let available = results
        .iter()
        .map(|result| result.available_budget)
        .collect::<Vec<_>>();
    let spent = results
        .iter()
        .map(|result| result.spent)
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Budget vs Spent").subtext("Per team"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(70)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Available")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(available),
        )
        .series(
            bar::Bar::new()
                .name("Spent")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(spent),
        )
}

pub(super) fn category_chart(spend_by_category: &[(String, f64)]) -> Chart {
    let data = spend_by_category
        .iter()
        .map(|(category, amount)| (*amount, category.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Spending by Category")
                .subtext("Selected period"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(Pie::new().name("Spent").radius("60%").data(data))
}

pub(super) fn monthly_spend_chart(year: i32, monthly_spend: &[f64; 12]) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Monthly Spending")
                .subtext(year.to_string()),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(MONTH_LABELS.to_vec()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Spent").data(monthly_spend.to_vec()))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('ko-KR', {
              style: 'currency',
              currency: 'KRW'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
