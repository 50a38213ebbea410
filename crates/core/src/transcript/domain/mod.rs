pub mod fragment;
pub mod fragment_segmenter;
pub mod transcript_reader;
pub mod word_group;
