//! Row layout of a review block.
//!
//! A review block is a container whose element children are rows: a header
//! (rating, title, date), an author row, a purchase-badge row, a "this review
//! is from" row and the body. Some blocks carry an extra helpful-votes row right after the header,
//! which pushes every following row down by one. Each block is classified on
//! its own and its rows are then looked up through [`BlockVariant::layout`].

use crate::amazon::selectors::reviews::HELPFUL_PHRASE;
use scraper::ElementRef;

/// Structural variant of a single review block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockVariant {
    Standard,
    WithHelpfulNotice,
}

/// Element-child index of each row used for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub header: usize,
    pub author: usize,
    pub body: usize,
}

const STANDARD: FieldLayout = FieldLayout { header: 0, author: 1, body: 4 };

const WITH_HELPFUL_NOTICE: FieldLayout = FieldLayout { header: 0, author: 2, body: 5 };

impl BlockVariant {
    /// Classifies a block by the row immediately following its header.
    pub fn classify(block: ElementRef) -> Self {
        let after_header = rows(block).nth(STANDARD.header + 1);

        match after_header {
            Some(row) if row.text().collect::<String>().contains(HELPFUL_PHRASE) => {
                BlockVariant::WithHelpfulNotice
            }
            _ => BlockVariant::Standard,
        }
    }

    /// Returns the row positions for this variant.
    pub const fn layout(self) -> FieldLayout {
        match self {
            BlockVariant::Standard => STANDARD,
            BlockVariant::WithHelpfulNotice => WITH_HELPFUL_NOTICE,
        }
    }
}

/// Element children of a block, in document order. Text nodes are not rows.
pub fn rows<'a>(block: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    block.children().filter_map(ElementRef::wrap)
}

/// Returns the row at `index`, if the block has that many rows.
pub fn row(block: ElementRef<'_>, index: usize) -> Option<ElementRef<'_>> {
    rows(block).nth(index)
}
