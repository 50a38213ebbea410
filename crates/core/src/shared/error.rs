/// Boxed error that can cross worker threads.
///
/// Ports return this instead of a bare `Box<dyn Error>` because segment
/// rendering runs on pool threads and failures are sent back to the caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
