pub mod segment_renderer;
pub mod segment_timeline;
