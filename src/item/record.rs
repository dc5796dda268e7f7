/// Book record definitions shared by the walker, the normalizer and the sinks
use crate::item::normalize::star_count;
use std::fmt;

/// Star rating of a book
///
/// Listing pages carry the rating as a CSS class token (`star-rating Three`).
/// The walker stores that token as [`StarRating::Word`]; the rating transform
/// stage rewrites it into [`StarRating::Stars`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarRating {
    /// Raw rating word as scraped from the page
    Word(String),

    /// Normalized star count, always in `0..=5`
    Stars(u8),
}

impl StarRating {
    /// Returns the numeric rating, normalizing a raw word on the fly
    pub fn stars(&self) -> u8 {
        match self {
            Self::Word(word) => star_count(word),
            Self::Stars(count) => (*count).min(5),
        }
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stars())
    }
}

/// One book scraped from a category listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub title: String,

    /// Price text including the currency symbol, e.g. `£51.77`
    pub price: String,

    pub availability: String,

    pub star: StarRating,

    /// Category label inherited from the listing page
    pub category: String,

    /// Absolute detail page URL, the natural key of a book
    pub product_url: String,

    /// Country drawn from the reference list; unrelated to the book itself
    pub country: String,
}

impl ItemRecord {
    /// Column headers of the export without the country column
    pub const BASE_HEADERS: [&'static str; 6] = [
        "title",
        "price",
        "availability",
        "star",
        "cate",
        "product_url",
    ];

    /// Returns the base columns in export order
    pub fn base_fields(&self) -> [String; 6] {
        [
            self.title.clone(),
            self.price.clone(),
            self.availability.clone(),
            self.star.to_string(),
            self.category.clone(),
            self.product_url.clone(),
        ]
    }
}
