//! The page that shows the allocation and expense tables exactly as fetched.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error, endpoints,
    html::{PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base},
    navigation::NavBar,
    report::ReportState,
    source::Table,
};

/// Display the raw source tables.
///
/// This is useful for checking which headers were picked up and spotting
/// cells that could not be read.
pub async fn get_sheets_page(State(state): State<ReportState>) -> Result<Response, Error> {
    let tables = state
        .source
        .get()
        .await
        .inspect_err(|error| tracing::error!("Could not fetch source tables: {error}"))?;

    let nav_bar = NavBar::new(endpoints::SHEETS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (table_view("Allocations", &tables.allocations))
            (table_view("Expenses", &tables.expenses))
        }
    );

    Ok(base("Source Sheets", &[], &content).into_response())
}

fn table_view(title: &str, table: &Table) -> Markup {
    html!(
        section class="w-full mb-8" data-table=(table.name)
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-xl font-semibold" { (title) }
                span class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (table.rows.len()) " rows"
                }
            }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            @for header in &table.headers {
                                th scope="col" class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (header) }
                            }
                        }
                    }

                    tbody
                    {
                        @for row in &table.rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                @for column in 0..table.headers.len() {
                                    td class=(TABLE_CELL_STYLE) { (Table::cell(row, column)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{FromRef, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Selector;

    use crate::{
        Error,
        report::ReportState,
        test_utils::{
            CountingSource, assert_valid_html, parse_html_document, sample_tables, test_state,
        },
    };

    use super::get_sheets_page;

    #[tokio::test]
    async fn shows_both_tables() {
        let state = test_state(CountingSource::new(Ok(sample_tables())), None);

        let response = get_sheets_page(State(ReportState::from_ref(&state)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let allocation_headers = html
            .select(&Selector::parse("section[data-table=allocations] th").unwrap())
            .map(|header| header.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(allocation_headers, vec!["팀", "월 기본예산", "3월 추가예산"]);

        let expense_rows = html
            .select(&Selector::parse("section[data-table=expenses] tbody tr").unwrap())
            .count();
        assert_eq!(expense_rows, 6);
    }

    #[tokio::test]
    async fn source_failure_is_service_unavailable() {
        let state = test_state(
            CountingSource::new(Err(Error::InvalidTable(
                "expenses".to_owned(),
                "unexpected end of file".to_owned(),
            ))),
            None,
        );

        let response = get_sheets_page(State(ReportState::from_ref(&state)))
            .await
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
