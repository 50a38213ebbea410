use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::shared::error::BoxError;
use crate::transcript::domain::fragment::Fragment;
use crate::transcript::domain::transcript_reader::TranscriptReader;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("failed to read transcript {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed transcript {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("fragment {index} in {path} ends at {end}s, not after its begin at {begin}s")]
    InvalidTiming {
        path: PathBuf,
        index: usize,
        begin: f64,
        end: f64,
    },
}

#[derive(Deserialize)]
struct SyncMap {
    fragments: Vec<Fragment>,
}

/// Reads aligner output of the form `{"fragments": [{"lines", "begin", "end"}, ...]}`.
pub struct JsonTranscriptReader;

impl JsonTranscriptReader {
    pub fn parse(path: &Path, json: &str) -> Result<Vec<Fragment>, TranscriptError> {
        let map: SyncMap = serde_json::from_str(json).map_err(|e| TranscriptError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        for (index, fragment) in map.fragments.iter().enumerate() {
            // Fragments without words are dropped before rendering; their timing is irrelevant.
            if fragment.is_renderable() && fragment.end <= fragment.begin {
                return Err(TranscriptError::InvalidTiming {
                    path: path.to_path_buf(),
                    index,
                    begin: fragment.begin,
                    end: fragment.end,
                });
            }
        }

        Ok(map.fragments)
    }
}

impl TranscriptReader for JsonTranscriptReader {
    fn read(&self, path: &Path) -> Result<Vec<Fragment>, BoxError> {
        let json = fs::read_to_string(path).map_err(|e| TranscriptError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let fragments = Self::parse(path, &json)?;
        log::info!(
            "Loaded {} fragments from {}",
            fragments.len(),
            path.display()
        );
        Ok(fragments)
    }
}
