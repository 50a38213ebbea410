pub mod constants;
pub mod error;
pub mod frame;
pub mod render_config;
pub mod video_metadata;
