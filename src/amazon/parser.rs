//! HTML parser for Amazon product pages and review listing pages.

use crate::amazon::layout::{self, BlockVariant};
use crate::amazon::models::{PageReviews, ReviewRecord};
use crate::amazon::selectors::{errors, pagination, product, reviews};
use crate::error::HarvestError;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace, warn};

/// Parser for Amazon review pages. Holds no state between pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Finds the `href` of the "see all reviews" link on a product page.
    pub fn locate_reviews_url(&self, product_page: &Html) -> Result<String, HarvestError> {
        let href = product_page
            .select(&product::REVIEWS_LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .filter(|href| !href.is_empty())
            .ok_or(HarvestError::EntryPointNotFound)?;

        debug!("Review listing entry point: {}", href);
        Ok(href.to_string())
    }

    /// Extracts every 5-star review on a listing page, in document order.
    ///
    /// Blocks missing a field are skipped and counted; a page without any
    /// 5-star block yields an empty result.
    pub fn extract_reviews(&self, page: &Html) -> PageReviews {
        let mut result = PageReviews::default();

        for block in self.review_blocks(page, &mut result.skipped) {
            match self.parse_block(block) {
                Ok(review) => {
                    trace!("Parsed review: {} by {}", review.title, review.author);
                    result.reviews.push(review);
                }
                Err(e) => {
                    warn!("Skipping review block: {}", e);
                    result.skipped += 1;
                }
            }
        }

        debug!(
            "Extracted {} 5-star reviews ({} malformed blocks skipped)",
            result.reviews.len(),
            result.skipped
        );

        result
    }

    /// Returns the `href` of the next listing page, if the page has one.
    ///
    /// Looks at the last link of the pagination control: it leads to the
    /// next page only when its text contains "Next".
    pub fn next_page_url(&self, page: &Html) -> Option<String> {
        let Some(last_link) = page.select(&pagination::PAGING).find_map(|paging| {
            paging
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "a")
                .last()
        }) else {
            debug!("No pagination links, last page reached");
            return None;
        };

        let label = last_link.text().collect::<String>();
        if !label.contains(pagination::NEXT_LABEL) {
            debug!("Last pagination link is {:?}, last page reached", label);
            return None;
        }

        last_link.value().attr("href").map(String::from)
    }

    /// Checks for CAPTCHA or error pages served in place of content.
    pub fn check_for_errors(&self, document: &Html) -> anyhow::Result<()> {
        if document.select(&errors::CAPTCHA).next().is_some() {
            anyhow::bail!(
                "CAPTCHA detected. Amazon is blocking requests. \
                Try using a proxy or waiting before retrying."
            );
        }

        if document.select(&errors::DOG_PAGE).next().is_some() {
            anyhow::bail!(
                "Amazon error page detected (503). \
                The service may be temporarily unavailable."
            );
        }

        Ok(())
    }

    /// Collects the review block of every 5-star indicator, once per block.
    fn review_blocks<'a>(&self, page: &'a Html, skipped: &mut usize) -> Vec<ElementRef<'a>> {
        let mut blocks: Vec<ElementRef<'a>> = Vec::new();

        for indicator in page.select(&reviews::FIVE_STAR) {
            let Some(block) =
                indicator.ancestors().nth(reviews::BLOCK_DEPTH - 1).and_then(ElementRef::wrap)
            else {
                warn!("5-star indicator outside of any review block");
                *skipped += 1;
                continue;
            };

            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }

        blocks
    }

    /// Reads title, date, author and body from one review block.
    fn parse_block(&self, block: ElementRef) -> Result<ReviewRecord, HarvestError> {
        let variant = BlockVariant::classify(block);
        let rows = variant.layout();
        trace!("Review block variant: {:?}", variant);

        let header = layout::row(block, rows.header).ok_or_else(|| malformed("header row"))?;
        let title = first_text(header, &reviews::TITLE).ok_or_else(|| malformed("title"))?;
        let date = first_text(header, &reviews::DATE).ok_or_else(|| malformed("date"))?;

        let author_row = layout::row(block, rows.author).ok_or_else(|| malformed("author row"))?;
        let author = first_text(author_row, &reviews::AUTHOR).ok_or_else(|| malformed("author"))?;

        let body = layout::row(block, rows.body)
            .map(|row| row.text().collect::<String>())
            .ok_or_else(|| malformed("body row"))?;

        Ok(ReviewRecord { title, date, author, body })
    }
}

fn first_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(|e| e.text().collect())
}

fn malformed(field: &str) -> HarvestError {
    HarvestError::MalformedReviewBlock(format!("missing {}", field))
}
