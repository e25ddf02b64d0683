//! Summary and detailed renderings of inventory records.
//!
//! Relationships are bidirectional, so renderings expand at most one level:
//! a detailed view embeds summaries of its parents or children, and summaries
//! only carry counts.

mod render;
mod types;

pub use render::{RenderContext, Serializable, reading_summary};
pub use types::{
    Detailed, NodeDetail, NodeSummary, ReadingDetail, ReadingSummary, SensorDetail, SensorSummary,
    SensorTypeDetail, SensorTypeSummary, Summary,
};
