pub mod frame_fitter;
pub mod overlay_compositor;
pub mod photo_reader;
pub mod subtitle_renderer;
