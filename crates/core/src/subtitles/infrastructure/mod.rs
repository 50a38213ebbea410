pub mod color_file_reader;
