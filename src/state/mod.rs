//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PipelineState`: lifecycle of the item pipeline (idle, opening, running, closing, closed)

mod pipeline_state;

pub use pipeline_state::PipelineState;
