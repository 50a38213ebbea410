use super::fragment::{word_pattern, Fragment};
use super::word_group::WordGroup;

/// Splits a fragment's line into fixed-size word groups and divides the
/// fragment's duration evenly between them.
pub struct FragmentSegmenter {
    words_per_group: usize,
}

impl FragmentSegmenter {
    pub fn new(words_per_group: usize) -> Self {
        Self {
            words_per_group: words_per_group.max(1),
        }
    }

    /// Lowercased word tokens with punctuation stripped.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        word_pattern()
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Groups are contiguous and cover `[0, duration)` of the fragment.
    /// Returns an empty vector when the line has no tokens.
    pub fn segment(&self, fragment: &Fragment) -> Vec<WordGroup> {
        let words = self.tokenize(fragment.text());
        if words.is_empty() {
            return Vec::new();
        }

        let chunks: Vec<Vec<String>> = words
            .chunks(self.words_per_group)
            .map(|chunk| chunk.to_vec())
            .collect();

        let duration = fragment.duration();
        let count = chunks.len();
        let group_duration = duration / count as f64;

        chunks
            .into_iter()
            .enumerate()
            .map(|(i, words)| {
                let end_offset = if i + 1 == count {
                    duration
                } else {
                    (i + 1) as f64 * group_duration
                };
                WordGroup {
                    words,
                    start_offset: i as f64 * group_duration,
                    end_offset,
                }
            })
            .collect()
    }
}
