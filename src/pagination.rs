//! This modules defines the common functionality for paging data.

use maud::{Markup, html};

use crate::html::BUTTON_SECONDARY_STYLE;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 25,
            max_pages: 5,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Clamp a requested page number to the range of pages that exist.
///
/// Returns `1` if there are no pages.
pub fn clamp_page(requested_page: u64, page_count: u64) -> u64 {
    requested_page.clamp(1, page_count.max(1))
}

/// The number of pages needed to show `item_count` items with `page_size` items per page.
pub fn page_count(item_count: usize, page_size: u64) -> u64 {
    (item_count as u64).div_ceil(page_size.max(1))
}

/// Render the pagination indicators as a list of links.
///
/// `page_url` maps a page number to the URL for that page, and is expected to
/// preserve any other query parameters such as filters.
pub fn pagination_view(indicators: &[PaginationIndicator], page_url: impl Fn(u64) -> String) -> Markup {
    let page_style = "block px-3 py-2 rounded hover:bg-gray-100 dark:hover:bg-gray-700";
    let current_style = "block px-3 py-2 rounded bg-blue-600 text-white";

    html!(
        nav class="pagination mt-4" aria-label="Pagination"
        {
            ul class="pagination flex items-center gap-1 text-sm"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page) => {
                                a href=(page_url(*page)) class=(page_style) { (page) }
                            }
                            PaginationIndicator::CurrPage(page) => {
                                p aria-current="page" class=(current_style) { (page) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span class="px-2" { "..." }
                            }
                            PaginationIndicator::NextButton(page) => {
                                a href=(page_url(*page)) role="button" class=(BUTTON_SECONDARY_STYLE) { "Next" }
                            }
                            PaginationIndicator::BackButton(page) => {
                                a href=(page_url(*page)) role="button" class=(BUTTON_SECONDARY_STYLE) { "Back" }
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
    use scraper::{ElementRef, Html, Selector};

    use crate::pagination::{
        PaginationIndicator, clamp_page, create_pagination_indicators, page_count,
        pagination_view,
    };

    #[test]
    fn shows_all_pages() {
        let want = [
            PaginationIndicator::CurrPage(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::Page(3),
            PaginationIndicator::NextButton(2),
        ];

        let got = create_pagination_indicators(1, 3, 5);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_no_indicators_without_pages() {
        let got = create_pagination_indicators(1, 0, 5);

        assert!(got.is_empty());
    }

    #[test]
    fn shows_page_subset_on_right() {
        let want = [
            PaginationIndicator::BackButton(9),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Page(8),
            PaginationIndicator::Page(9),
            PaginationIndicator::CurrPage(10),
        ];

        let got = create_pagination_indicators(10, 10, 5);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn pagination_indicator_shows_page_subset_in_center() {
        let want = [
            PaginationIndicator::BackButton(4),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::CurrPage(5),
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(6),
        ];

        let got = create_pagination_indicators(5, 10, 5);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn counts_and_clamps_pages() {
        assert_eq!(page_count(0, 25), 0);
        assert_eq!(page_count(25, 25), 1);
        assert_eq!(page_count(26, 25), 2);

        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn view_links_each_indicator() {
        let indicators = create_pagination_indicators(2, 3, 5);

        let html = pagination_view(&indicators, |page| format!("/transactions?page={page}"));

        let fragment = Html::parse_fragment(&html.into_string());
        let list = fragment
            .select(&Selector::parse("nav.pagination > ul.pagination").unwrap())
            .next()
            .expect("No pagination indicator found");
        let items = list
            .select(&Selector::parse("li").unwrap())
            .collect::<Vec<ElementRef>>();
        assert_eq!(items.len(), indicators.len());

        let link_selector = Selector::parse("a").unwrap();
        let back = items[0].select(&link_selector).next().unwrap();
        assert_eq!(back.attr("href"), Some("/transactions?page=1"));
        assert_eq!(back.attr("role"), Some("button"));
        assert_eq!(back.text().collect::<String>().trim(), "Back");

        assert!(
            items[2].select(&link_selector).next().is_none(),
            "The current page indicator should not contain a link"
        );
        let current = items[2]
            .select(&Selector::parse("p").unwrap())
            .next()
            .expect("Current page indicator should have a paragraph element ('<p>')");
        assert_eq!(current.attr("aria-current"), Some("page"));
        assert_eq!(current.text().collect::<String>().trim(), "2");

        let next = items[4].select(&link_selector).next().unwrap();
        assert_eq!(next.attr("href"), Some("/transactions?page=3"));
        assert_eq!(next.text().collect::<String>().trim(), "Next");
    }
}
