//! Segmented inverted index

pub mod buffer;
pub mod deletions;
pub mod dictionary;
pub mod manager;
pub mod merge;
pub mod segment;

pub use manager::{Documents, IndexManager, PositionalSnapshot, SegmentSnapshot};
