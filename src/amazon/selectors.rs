//! CSS selectors and label constants for Amazon review pages.
//!
//! Everything that depends on Amazon's markup lives here or in
//! [`crate::amazon::layout`]. Update these when the review pages change.
//!
//! **Update process**: When harvesting fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the product detail page.
pub mod product {
    use super::*;

    /// "See all N customer reviews" link inside the review summary box.
    pub static REVIEWS_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#revF > div > a[href]").unwrap());
}

/// Selectors for a review listing page.
pub mod reviews {
    use super::*;

    /// Rating label carried by a 5-star review. Matched by exact equality.
    pub const FIVE_STAR_LABEL: &str = "5.0 out of 5 stars";

    /// Star-rating indicator of a 5-star review.
    pub static FIVE_STAR: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(&format!("span[title='{}']", FIVE_STAR_LABEL)).unwrap()
    });

    /// Levels between the rating indicator and its review block.
    pub const BLOCK_DEPTH: usize = 3;

    /// Review title, inside the header row.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());

    /// Review date, inside the header row.
    pub static DATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("nobr").unwrap());

    /// Reviewer name: the profile link inside the author row.
    pub static AUTHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

    /// Text of the optional "N of M people found the following review helpful" row.
    pub const HELPFUL_PHRASE: &str = "people found the following review helpful";
}

/// Selectors for the pagination control of a listing page.
pub mod pagination {
    use super::*;

    /// Pagination container; its links are direct `<a>` children. The class
    /// attribute must be exactly `paging`.
    pub static PAGING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class='paging']").unwrap());

    /// Label carried by the link to the following page.
    pub const NEXT_LABEL: &str = "Next";
}

/// Selectors for detecting anti-bot pages served instead of content.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's 503 error page), matched on its exact markers.
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[alt='Dogs of Amazon'], \
             a[href='/ref=cs_503_link']",
        )
        .unwrap()
    });
}
