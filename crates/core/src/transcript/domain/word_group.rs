/// A run of at most `words_per_group` tokens with its own time window.
///
/// Offsets are relative to the owning fragment's `begin`.
#[derive(Clone, Debug, PartialEq)]
pub struct WordGroup {
    pub words: Vec<String>,
    pub start_offset: f64,
    pub end_offset: f64,
}

impl WordGroup {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn duration(&self) -> f64 {
        self.end_offset - self.start_offset
    }

    /// Window in master-audio time for a fragment starting at `fragment_begin`.
    pub fn absolute_window(&self, fragment_begin: f64) -> (f64, f64) {
        (
            fragment_begin + self.start_offset,
            fragment_begin + self.end_offset,
        )
    }

    /// Whether `offset` (fragment-relative) falls in `[start, end)`.
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start_offset && offset < self.end_offset
    }
}
