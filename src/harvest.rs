//! Page-by-page walk over a product's review listing.
//!
//! The walk starts from the product page (seeding), then processes one listing
//! page at a time: extract its 5-star reviews, resolve the next page, fetch it.
//! It ends when a page has no "Next" link (done), or on a failure. A failure
//! before the first listing page is processed is fatal; a later one stops the
//! walk and keeps the reviews collected so far.

use crate::amazon::client::PageSource;
use crate::amazon::models::{Harvest, PageReviews};
use crate::amazon::parser::Parser;
use crate::error::HarvestError;
use scraper::Html;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Harvests every 5-star review reachable from a product page.
///
/// Holds no state between runs; each call to [`harvest`](Self::harvest)
/// starts from scratch.
pub struct HarvestWalker<'a, S: PageSource + ?Sized> {
    source: &'a S,
    parser: Parser,
    cancel: CancellationToken,
}

impl<'a, S: PageSource + ?Sized> HarvestWalker<'a, S> {
    /// Creates a walker that loads pages through `source`.
    pub fn new(source: &'a S) -> Self {
        Self { source, parser: Parser::new(), cancel: CancellationToken::new() }
    }

    /// Uses `token` to stop the walk; checked before each listing page.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the walk for the product at `product_url`.
    pub async fn harvest(&self, product_url: &str) -> Result<Harvest, HarvestError> {
        let mut page_url = self.seed(product_url).await?;
        let mut html = self.load(&page_url).await?;

        let mut visited = HashSet::from([page_url.clone()]);
        let mut harvest = Harvest::default();

        loop {
            if self.cancel.is_cancelled() {
                return stop(harvest, HarvestError::Cancelled);
            }

            let (page, next_href) = match self.scan(&html, &page_url) {
                Ok(scanned) => scanned,
                Err(e) => return stop(harvest, e),
            };

            harvest.pages_visited += 1;
            harvest.skipped_blocks += page.skipped;
            info!(
                "Page {}: {} 5-star reviews ({} total)",
                harvest.pages_visited,
                page.reviews.len(),
                harvest.reviews.len() + page.reviews.len()
            );
            harvest.reviews.extend(page.reviews);

            let Some(href) = next_href else {
                info!("Harvest complete: {} reviews", harvest.reviews.len());
                return Ok(harvest);
            };

            let next_url = resolve_url(&page_url, &href);
            if !visited.insert(next_url.clone()) {
                warn!("Pagination loops back to {}, stopping", next_url);
                return Ok(harvest);
            }

            html = match self.load(&next_url).await {
                Ok(html) => html,
                Err(e) => return stop(harvest, e),
            };
            page_url = next_url;
        }
    }

    /// Loads the product page and resolves the first listing page URL.
    async fn seed(&self, product_url: &str) -> Result<String, HarvestError> {
        let html = self.load(product_url).await?;

        let document = Html::parse_document(&html);
        self.parser
            .check_for_errors(&document)
            .map_err(|e| HarvestError::fetch_failed(product_url, &e))?;

        let href = self.parser.locate_reviews_url(&document)?;
        Ok(resolve_url(product_url, &href))
    }

    async fn load(&self, url: &str) -> Result<String, HarvestError> {
        self.source.fetch(url).await.map_err(|e| {
            warn!("Failed to fetch {}: {:#}", url, e);
            HarvestError::fetch_failed(url, &e)
        })
    }

    /// Parses one listing page into its reviews and the raw next-page `href`.
    fn scan(&self, html: &str, url: &str) -> Result<(PageReviews, Option<String>), HarvestError> {
        let document = Html::parse_document(html);
        self.parser.check_for_errors(&document).map_err(|e| HarvestError::fetch_failed(url, &e))?;

        let reviews = self.parser.extract_reviews(&document);
        let next = self.parser.next_page_url(&document);
        debug!("Next page of {}: {:?}", url, next);

        Ok((reviews, next))
    }
}

/// Ends the walk on `err`: fatal if no listing page was processed yet.
fn stop(mut harvest: Harvest, err: HarvestError) -> Result<Harvest, HarvestError> {
    if harvest.pages_visited == 0 {
        return Err(err);
    }

    warn!(
        "Harvest stopped after {} pages, keeping {} reviews: {}",
        harvest.pages_visited,
        harvest.reviews.len(),
        err
    );
    harvest.interrupted = Some(err);
    Ok(harvest)
}

/// Resolves a possibly relative `href` against the page it was found on.
fn resolve_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            debug!("Could not resolve {} against {}: {}", href, base, e);
            href.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::models::ReviewRecord;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const PRODUCT: &str = "https://shop.test/dp/B00ATL6OOG";
    const PAGE_1: &str = "https://shop.test/product-reviews/B00ATL6OOG";
    const PAGE_2: &str = "https://shop.test/product-reviews/B00ATL6OOG?pageNumber=2";
    const PAGE_3: &str = "https://shop.test/product-reviews/B00ATL6OOG?pageNumber=3";

    /// In-memory pages keyed by URL, recording every fetch.
    #[derive(Default)]
    struct MockSource {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
        cancel_on: Option<(String, CancellationToken)>,
    }

    impl MockSource {
        fn with_page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }

        fn cancel_on(mut self, url: &str, token: CancellationToken) -> Self {
            self.cancel_on = Some((url.to_string(), token));
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for MockSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.fetched.lock().unwrap().push(url.to_string());

            if let Some((trigger, token)) = &self.cancel_on {
                if trigger == url {
                    token.cancel();
                }
            }

            match self.pages.get(url) {
                Some(html) => Ok(html.clone()),
                None => anyhow::bail!("Request failed with status: 404 Not Found"),
            }
        }
    }

    fn product_page(href: &str) -> String {
        format!(
            r#"<html><body><div id="revF"><div><a href="{}">See all customer reviews</a></div></div></body></html>"#,
            href
        )
    }

    fn block(stars: &str, n: &str, helpful: bool) -> String {
        let notice = if helpful {
            "<div>2 of 2 people found the following review helpful</div>"
        } else {
            ""
        };
        format!(
            r#"<div><div><span><span title="{stars}"></span></span><span><b>Title {n}</b>, <nobr>Date {n}</nobr></span></div>{notice}<div>By <a href="/profile/{n}">Author {n}</a></div><div>Amazon Verified Purchase</div><div>This review is from: Sauce</div><div>Body {n}</div></div>"#
        )
    }

    fn five(n: &str) -> String {
        block("5.0 out of 5 stars", n, false)
    }

    fn listing(blocks: &[String], next: Option<&str>) -> String {
        let paging = match next {
            Some(href) => format!(
                r#"<span class="paging"><a href="/x">&lsaquo; Previous</a><a href="{}">Next &rsaquo;</a></span>"#,
                href
            ),
            None => String::new(),
        };
        format!("<html><body>{}{}</body></html>", blocks.join(""), paging)
    }

    fn review(n: &str) -> ReviewRecord {
        ReviewRecord::new(
            format!("Title {}", n),
            format!("Date {}", n),
            format!("Author {}", n),
            format!("Body {}", n),
        )
    }

    fn two_page_source() -> MockSource {
        MockSource::default()
            .with_page(PRODUCT, product_page("/product-reviews/B00ATL6OOG"))
            .with_page(PAGE_1, listing(&[five("1"), five("2"), five("3")], Some(PAGE_2)))
            .with_page(PAGE_2, listing(&[five("4")], None))
    }

    #[tokio::test]
    async fn test_missing_entry_point() {
        let source = MockSource::default()
            .with_page(PRODUCT, "<html><body><h1>No reviews yet</h1></body></html>".to_string());

        let result = HarvestWalker::new(&source).harvest(PRODUCT).await;
        assert_eq!(result, Err(HarvestError::EntryPointNotFound));
        assert_eq!(source.fetched(), vec![PRODUCT]);
    }

    #[tokio::test]
    async fn test_two_page_listing() {
        let source = two_page_source();

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1"), review("2"), review("3"), review("4")]);
        assert_eq!(harvest.pages_visited, 2);
        assert_eq!(harvest.skipped_blocks, 0);
        assert!(harvest.is_complete());
        assert_eq!(source.fetched(), vec![PRODUCT, PAGE_1, PAGE_2]);
    }

    #[tokio::test]
    async fn test_only_block_has_helpful_notice() {
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[block("5.0 out of 5 stars", "7", true)], None));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("7")]);
    }

    #[tokio::test]
    async fn test_pages_in_link_order() {
        // Page 3 is linked from page 1 and page 2 from page 3
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[five("a")], Some(PAGE_3)))
            .with_page(PAGE_3, listing(&[five("b"), block("4.0 out of 5 stars", "x", false)], Some(PAGE_2)))
            .with_page(PAGE_2, listing(&[five("c")], None));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("a"), review("b"), review("c")]);
        assert_eq!(harvest.pages_visited, 3);
        assert_eq!(source.fetched(), vec![PRODUCT, PAGE_1, PAGE_3, PAGE_2]);
    }

    #[tokio::test]
    async fn test_pages_without_five_star_reviews() {
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[block("3.0 out of 5 stars", "1", false)], Some(PAGE_2)))
            .with_page(PAGE_2, listing(&[], None));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert!(harvest.is_empty());
        assert!(harvest.is_complete());
        assert_eq!(harvest.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_harvest_is_idempotent() {
        let source = two_page_source();
        let walker = HarvestWalker::new(&source);

        let first = walker.harvest(PRODUCT).await.unwrap();
        let second = walker.harvest(PRODUCT).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.reviews).unwrap(),
            serde_json::to_string(&second.reviews).unwrap()
        );
    }

    #[tokio::test]
    async fn test_product_page_fetch_failure() {
        let source = MockSource::default();

        let result = HarvestWalker::new(&source).harvest(PRODUCT).await;
        match result {
            Err(HarvestError::PageFetchFailed { url, reason }) => {
                assert_eq!(url, PRODUCT);
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_listing_page_failure_is_fatal() {
        let source = MockSource::default().with_page(PRODUCT, product_page(PAGE_1));

        let result = HarvestWalker::new(&source).harvest(PRODUCT).await;
        assert!(matches!(
            result,
            Err(HarvestError::PageFetchFailed { ref url, .. }) if url == PAGE_1
        ));
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_partial_reviews() {
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[five("1"), five("2")], Some(PAGE_2)));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1"), review("2")]);
        assert_eq!(harvest.pages_visited, 1);
        assert!(!harvest.is_complete());
        assert!(matches!(
            harvest.interrupted,
            Some(HarvestError::PageFetchFailed { ref url, .. }) if url == PAGE_2
        ));
    }

    #[tokio::test]
    async fn test_blocked_listing_page() {
        let captcha = r#"<html><body><form action="/errors/validateCaptcha"></form></body></html>"#;
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[five("1")], Some(PAGE_2)))
            .with_page(PAGE_2, captcha.to_string());

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1")]);
        match harvest.interrupted {
            Some(HarvestError::PageFetchFailed { url, reason }) => {
                assert_eq!(url, PAGE_2);
                assert!(reason.contains("CAPTCHA"));
            }
            other => panic!("unexpected interruption: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_product_image_mentioning_dog_is_not_blocked() {
        let product = format!(
            r#"<html><body><img alt="Hot dog roller, 8 dogs"><div id="revF"><div><a href="{}">See all</a></div></div></body></html>"#,
            PAGE_1
        );
        let source = MockSource::default()
            .with_page(PRODUCT, product)
            .with_page(PAGE_1, listing(&[five("1")], None));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1")]);
        assert!(harvest.is_complete());
    }

    #[tokio::test]
    async fn test_blocked_product_page_is_fatal() {
        let dog = r#"<html><body><a href="/ref=cs_503_link"><img alt="Dogs of Amazon"></a></body></html>"#;
        let source = MockSource::default().with_page(PRODUCT, dog.to_string());

        let result = HarvestWalker::new(&source).harvest(PRODUCT).await;
        assert!(matches!(result, Err(HarvestError::PageFetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_mid_walk_keeps_partial_reviews() {
        let token = CancellationToken::new();
        let source = two_page_source().cancel_on(PAGE_2, token.clone());

        let harvest =
            HarvestWalker::new(&source).with_cancellation(token).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1"), review("2"), review("3")]);
        assert_eq!(harvest.pages_visited, 1);
        assert_eq!(harvest.interrupted, Some(HarvestError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let token = CancellationToken::new();
        token.cancel();
        let source = two_page_source();

        let result = HarvestWalker::new(&source).with_cancellation(token).harvest(PRODUCT).await;
        assert_eq!(result, Err(HarvestError::Cancelled));
    }

    #[tokio::test]
    async fn test_pagination_cycle_stops() {
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[five("1")], Some(PAGE_2)))
            .with_page(PAGE_2, listing(&[five("2")], Some(PAGE_1)));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1"), review("2")]);
        assert!(harvest.is_complete());
        assert_eq!(source.fetched(), vec![PRODUCT, PAGE_1, PAGE_2]);
    }

    #[tokio::test]
    async fn test_malformed_blocks_counted() {
        let broken = r#"<div><div><span><span title="5.0 out of 5 stars"></span></span></div></div>"#;
        let source = MockSource::default()
            .with_page(PRODUCT, product_page(PAGE_1))
            .with_page(PAGE_1, listing(&[broken.to_string(), five("1")], Some(PAGE_2)))
            .with_page(PAGE_2, listing(&[broken.to_string()], None));

        let harvest = HarvestWalker::new(&source).harvest(PRODUCT).await.unwrap();
        assert_eq!(harvest.reviews, vec![review("1")]);
        assert_eq!(harvest.skipped_blocks, 2);
        assert!(harvest.is_complete());
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url(PRODUCT, "/product-reviews/B00ATL6OOG"), PAGE_1);
        assert_eq!(resolve_url(PAGE_1, "?pageNumber=2"), PAGE_2);
        assert_eq!(resolve_url(PAGE_1, "http://other.test/r"), "http://other.test/r");
        // Unparseable base keeps the href untouched
        assert_eq!(resolve_url("not a url", "/r?p=2"), "/r?p=2");
    }
}
