//! Data models for harvested reviews and harvest results.

use crate::error::HarvestError;
use serde::{Deserialize, Serialize};

/// A single 5-star review, as extracted from a listing page.
///
/// Fields hold the page text verbatim; nothing is trimmed or normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Review headline
    pub title: String,
    /// Review date as rendered on the page
    pub date: String,
    /// Reviewer display name
    pub author: String,
    /// Review text
    pub body: String,
}

impl ReviewRecord {
    /// Creates a review record.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self { title: title.into(), date: date.into(), author: author.into(), body: body.into() }
    }
}

/// Reviews extracted from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReviews {
    /// 5-star reviews in document order
    pub reviews: Vec<ReviewRecord>,
    /// Number of 5-star blocks skipped because a field was missing
    pub skipped: usize,
}

/// Outcome of a harvest that produced a usable (possibly partial) result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Harvest {
    /// Reviews in page order, then document order within a page
    pub reviews: Vec<ReviewRecord>,
    /// Number of listing pages processed
    pub pages_visited: usize,
    /// Number of malformed 5-star blocks skipped across all pages
    pub skipped_blocks: usize,
    /// Set when the walk stopped before pagination ended
    pub interrupted: Option<HarvestError>,
}

impl Harvest {
    /// Returns the number of harvested reviews.
    pub fn count(&self) -> usize {
        self.reviews.len()
    }

    /// Returns true if no reviews were harvested.
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Returns true if pagination ran to its end.
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Status indicator of a harvest response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestStatus {
    /// Every listing page was harvested
    Ok,
    /// The walk stopped early; `reviews` holds what was collected
    Partial,
    /// Fatal failure; `reviews` is empty
    Error,
}

/// Caller-facing result: a status, a human-readable message and the reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestResponse {
    pub status: HarvestStatus,
    pub message: String,
    pub reviews: Vec<ReviewRecord>,
}

impl HarvestResponse {
    /// Builds a response from the outcome of a harvest.
    pub fn from_outcome(outcome: Result<Harvest, HarvestError>) -> Self {
        match outcome {
            Ok(harvest) => {
                let message = match &harvest.interrupted {
                    None => format!(
                        "Found {} 5-star reviews across {} pages",
                        harvest.count(),
                        harvest.pages_visited
                    ),
                    Some(err) => format!(
                        "Stopped after {} pages with {} 5-star reviews: {}",
                        harvest.pages_visited,
                        harvest.count(),
                        err
                    ),
                };
                let status = if harvest.is_complete() {
                    HarvestStatus::Ok
                } else {
                    HarvestStatus::Partial
                };
                Self { status, message, reviews: harvest.reviews }
            }
            Err(err) => {
                Self { status: HarvestStatus::Error, message: err.to_string(), reviews: Vec::new() }
            }
        }
    }

    /// Returns true unless the harvest failed outright.
    pub fn is_success(&self) -> bool {
        self.status != HarvestStatus::Error
    }
}
