//! Book records and their normalization

mod normalize;
mod record;

pub use normalize::{normalize_item, star_count};
pub use record::{ItemRecord, StarRating};
