use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

const WORD_PATTERN: &str = r"\b\w+\b";

/// Word tokens as subtitles count them: runs of word characters, punctuation excluded.
pub fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WORD_PATTERN).expect("word pattern is a valid regex"))
}

/// One timestamped line of narration.
///
/// Only the first entry of `lines` is rendered; aligners emit one line per
/// fragment in practice.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub begin: f64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub end: f64,
}

impl Fragment {
    pub fn new(text: &str, begin: f64, end: f64) -> Self {
        Self {
            id: None,
            lines: vec![text.to_string()],
            begin,
            end,
        }
    }

    /// First line with surrounding whitespace removed, or `""`.
    pub fn text(&self) -> &str {
        self.lines.first().map(|l| l.trim()).unwrap_or("")
    }

    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }

    /// Only fragments with at least one word token become segments, so every
    /// rendered segment has one or more word groups.
    pub fn is_renderable(&self) -> bool {
        word_pattern().is_match(self.text())
    }
}

/// Accepts `1.28` as well as `"1.280"`, which is how forced aligners
/// serialise timestamps.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    let value = match Seconds::deserialize(deserializer)? {
        Seconds::Number(value) => value,
        Seconds::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{text}': {e}")))?,
    };
    // `str::parse` accepts "inf", "NaN" and overflowing exponents.
    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "timestamp must be a finite number of seconds, got {value}"
        )));
    }
    Ok(value)
}
