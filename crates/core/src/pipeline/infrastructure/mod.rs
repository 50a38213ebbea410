pub mod threaded_segment_executor;
