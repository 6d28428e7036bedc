//! Error kinds raised while harvesting reviews.

/// Failure kinds of a harvest.
///
/// `EntryPointNotFound` and a failed fetch before the first listing page has
/// been processed are fatal. Later failures end the walk but keep the records
/// collected so far. `MalformedReviewBlock` never leaves the parser: the block
/// is skipped and counted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarvestError {
    /// The product page has no "see all reviews" link.
    #[error("No link to the review listing found on the product page")]
    EntryPointNotFound,

    /// A page required by the harvest could not be loaded.
    #[error("Failed to load {url}: {reason}")]
    PageFetchFailed { url: String, reason: String },

    /// A 5-star block lacked one of its fields, even after the layout shift.
    #[error("Malformed review block: {0}")]
    MalformedReviewBlock(String),

    /// The caller cancelled the walk (Ctrl-C or deadline).
    #[error("Harvest cancelled")]
    Cancelled,
}

impl HarvestError {
    /// Builds a `PageFetchFailed` from a collaborator error, keeping its context chain.
    pub fn fetch_failed(url: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::PageFetchFailed { url: url.into(), reason: format!("{:#}", err) }
    }
}
