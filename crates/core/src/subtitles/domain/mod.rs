pub mod color_map;
