pub mod assemble_video_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod segment_executor;
pub mod work_dir;
