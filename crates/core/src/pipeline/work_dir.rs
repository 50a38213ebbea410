use std::fs;
use std::io;
use std::path::Path;

use crate::shared::constants::{
    CONCAT_MANIFEST_FILENAME, CONCATENATED_FILENAME, FINAL_OUTPUT_FILENAME, SEGMENT_FILE_PREFIX,
};

/// Whether `name` is a file the assembler writes along the way.
///
/// Only these are ever deleted, so pointing the output at a directory that
/// holds other files is safe.
pub fn is_intermediate(name: &str) -> bool {
    if name == CONCAT_MANIFEST_FILENAME || name == CONCATENATED_FILENAME {
        return true;
    }
    if name.ends_with(".mux.mp4") {
        return true;
    }
    name.strip_prefix(SEGMENT_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Creates `dir` if needed and removes intermediates left by an earlier run.
/// A previous final output is kept until the new one replaces it.
pub fn prepare(dir: &Path) -> io::Result<usize> {
    fs::create_dir_all(dir)?;
    purge_intermediates(dir)
}

/// Deletes every intermediate file directly inside `dir`, returning how many
/// were removed.
pub fn purge_intermediates(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_intermediate(name) && name != FINAL_OUTPUT_FILENAME {
            fs::remove_file(entry.path())?;
            log::debug!("Deleted intermediate file {name}");
            removed += 1;
        }
    }
    Ok(removed)
}
