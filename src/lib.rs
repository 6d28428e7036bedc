//! amz-reviews - Harvest every 5-star review of an Amazon product
//!
//! Starts from a product page, follows the "see all reviews" link, then walks
//! the review listing page by page until the last "Next" link.

pub mod amazon;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod harvest;

pub use amazon::models::{Harvest, HarvestResponse, HarvestStatus, ReviewRecord};
pub use config::Config;
pub use error::HarvestError;
pub use harvest::HarvestWalker;
