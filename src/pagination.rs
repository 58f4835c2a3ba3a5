//! Splitting lists into pages and rendering the page links.

use maud::{Markup, html};

use crate::{Error, html::LINK_STYLE};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of rows on each page.
    pub page_size: u64,
    /// The maximum number of page links to show around the current page.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            max_pages: 5,
        }
    }
}

impl PaginationConfig {
    /// The number of pages needed for `row_count` rows.
    pub fn page_count(&self, row_count: u64) -> u64 {
        row_count.div_ceil(self.page_size.max(1))
    }

    /// The row offset of the first row on `page`.
    pub fn offset(&self, page: u64) -> u64 {
        page.saturating_sub(1) * self.page_size
    }
}

/// Resolve the `page` query parameter to a 1-based page number.
///
/// A missing page is the first page and `last` is the last page. The first
/// page always exists, even when there are no rows.
///
/// # Errors
/// Returns [Error::NotFound] if `raw_page` is not a number or is past the
/// last page.
pub fn resolve_page(raw_page: Option<&str>, page_count: u64) -> Result<u64, Error> {
    let last_page = page_count.max(1);

    let page = match raw_page.map(str::trim) {
        None | Some("") => 1,
        Some("last") => last_page,
        Some(raw_page) => raw_page.parse::<u64>().map_err(|_| Error::NotFound)?,
    };

    if page == 0 || page > last_page {
        return Err(Error::NotFound);
    }

    Ok(page)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Build the list of page links for `curr_page` out of `page_count` pages.
///
/// At most `max_pages` consecutive pages are shown. The first and last pages
/// are always reachable, with an ellipsis standing in for the skipped pages.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    if page_count == 0 {
        return Vec::new();
    }

    let window = max_pages.clamp(1, page_count);
    let half = window / 2;
    let first = curr_page
        .saturating_sub(half)
        .clamp(1, page_count - window + 1);
    let last = first + window - 1;

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if first > 1 {
        indicators.push(PaginationIndicator::Page(1));
    }

    if first > 2 {
        indicators.push(PaginationIndicator::Ellipsis);
    }

    indicators.extend((first..=last).map(|page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    }));

    if last + 1 < page_count {
        indicators.push(PaginationIndicator::Ellipsis);
    }

    if last < page_count {
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the page links. `page_url` builds the URL of a page.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    html! {
        @if !indicators.is_empty() {
            nav class="flex justify-center pt-4" aria-label="Pagination"
            {
                ul class="inline-flex items-center gap-3"
                {
                    @for indicator in indicators {
                        li
                        {
                            @match indicator {
                                PaginationIndicator::Page(page) => {
                                    a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                                }
                                PaginationIndicator::CurrPage(page) => {
                                    span aria-current="page" class="font-bold" { (page) }
                                }
                                PaginationIndicator::Ellipsis => {
                                    span { "..." }
                                }
                                PaginationIndicator::BackButton(page) => {
                                    a href=(page_url(*page)) class=(LINK_STYLE) { "Back" }
                                }
                                PaginationIndicator::NextButton(page) => {
                                    a href=(page_url(*page)) class=(LINK_STYLE) { "Next" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
