//! Segmentation: partitions subscriber profiles into named cohorts by
//! experience, style affinity, engagement and tenure.

pub mod engine;
pub mod segments;

pub use engine::{SegmentMap, Segmenter};
pub use segments::SegmentKey;
