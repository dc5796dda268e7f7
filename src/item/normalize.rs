//! Field normalization for scraped book records
//!
//! Normalization never fails: rating words outside the known vocabulary
//! degrade to a rating of 0.

use crate::item::record::{ItemRecord, StarRating};

const RATING_WORDS: [(&str, u8); 5] = [
    ("One", 1),
    ("Two", 2),
    ("Three", 3),
    ("Four", 4),
    ("Five", 5),
];

/// Maps a rating word to its star count
///
/// Matching ignores surrounding whitespace and ASCII case. Unknown words map to 0.
///
/// # Example
///
/// ```
/// use shelf_scrape::star_count;
///
/// assert_eq!(star_count("Three"), 3);
/// assert_eq!(star_count("five"), 5);
/// assert_eq!(star_count("Zero"), 0);
/// ```
pub fn star_count(word: &str) -> u8 {
    let word = word.trim();
    RATING_WORDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map(|(_, stars)| *stars)
        .unwrap_or(0)
}

/// Returns a normalized copy of a scraped record
///
/// Text fields are trimmed and the rating is replaced by its star count.
pub fn normalize_item(item: ItemRecord) -> ItemRecord {
    let star = StarRating::Stars(item.star.stars());
    ItemRecord {
        title: item.title.trim().to_string(),
        price: item.price.trim().to_string(),
        availability: item.availability.trim().to_string(),
        star,
        category: item.category.trim().to_string(),
        product_url: item.product_url.trim().to_string(),
        country: item.country.trim().to_string(),
    }
}
