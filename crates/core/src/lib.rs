pub mod audio;
pub mod imaging;
pub mod layout;
pub mod pipeline;
pub mod rendering;
pub mod shared;
pub mod subtitles;
pub mod transcript;
pub mod video;
