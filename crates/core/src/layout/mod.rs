pub mod project_layout;
