//! Amazon-specific modules for HTTP client, parsing, and data models.

pub mod client;
pub mod layout;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{AmazonClient, PageSource};
pub use models::{Harvest, HarvestResponse, HarvestStatus, ReviewRecord};
pub use parser::Parser;
