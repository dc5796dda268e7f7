//! Rating transform stage
//!
//! Not a persistence backend: it shares the sink callback shape so the
//! coordinator can chain it in front of the writers.

use crate::item::{normalize_item, ItemRecord};
use crate::sink::traits::{Sink, SinkResult};

/// Rewrites the scraped rating word into a star count and trims text fields
#[derive(Debug, Default)]
pub struct RatingTransform;

impl RatingTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for RatingTransform {
    fn name(&self) -> &str {
        "rating-transform"
    }

    fn open(&mut self) -> SinkResult<()> {
        Ok(())
    }

    fn process(&mut self, item: ItemRecord) -> SinkResult<Option<ItemRecord>> {
        Ok(Some(normalize_item(item)))
    }

    fn close(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
