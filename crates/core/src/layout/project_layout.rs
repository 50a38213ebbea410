use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use walkdir::WalkDir;

use crate::shared::constants::{
    AUDIO_DIR_NAME, AUDIO_EXTENSIONS, COLORS_DIR_NAME, COLORS_FILENAME, FONT_DIR_NAME,
    FONT_EXTENSIONS, IMAGE_EXTENSIONS, PHOTOS_DIR_NAME, TRANSCRIPT_DIR_NAME,
};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("no '{name}' directory found under {root}")]
    MissingDirectory { name: &'static str, root: PathBuf },
    #[error("no {what} found in {dir}")]
    NoFiles { what: &'static str, dir: PathBuf },
    #[error("{0} does not exist")]
    MissingPath(PathBuf),
    #[error("failed to scan {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Explicit paths that skip discovery for one input each.
#[derive(Clone, Debug, Default)]
pub struct LayoutOverrides {
    pub transcript: Option<PathBuf>,
    /// A photo directory, or a single photo file.
    pub photos: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub colors: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

/// Every input file of a project, resolved before any rendering starts.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectLayout {
    pub transcript: PathBuf,
    pub photos: Vec<PathBuf>,
    pub audio: PathBuf,
    pub colors: PathBuf,
    pub font: PathBuf,
}

impl ProjectLayout {
    pub fn discover(root: &Path) -> Result<Self, LayoutError> {
        Self::resolve(root, &LayoutOverrides::default())
    }

    /// Resolves each input from `overrides` when given, otherwise from the
    /// conventional directory found anywhere under `root`.
    pub fn resolve(root: &Path, overrides: &LayoutOverrides) -> Result<Self, LayoutError> {
        let index = DirectoryIndex::build(root)?;

        let transcript = match &overrides.transcript {
            Some(path) => existing(path)?,
            None => {
                let dir = index.find(TRANSCRIPT_DIR_NAME)?;
                first_file(dir, &["json"], "transcript JSON")?
            }
        };

        let photos = match &overrides.photos {
            Some(path) if path.is_file() => vec![path.clone()],
            Some(path) => files_with_extensions(existing(path)?.as_path(), IMAGE_EXTENSIONS)?,
            None => files_with_extensions(index.find(PHOTOS_DIR_NAME)?, IMAGE_EXTENSIONS)?,
        };
        if photos.is_empty() {
            let dir = overrides
                .photos
                .clone()
                .unwrap_or_else(|| root.join(PHOTOS_DIR_NAME));
            return Err(LayoutError::NoFiles { what: "photos", dir });
        }

        let audio = match &overrides.audio {
            Some(path) => existing(path)?,
            None => newest_file(index.find(AUDIO_DIR_NAME)?, AUDIO_EXTENSIONS)?,
        };

        let colors = match &overrides.colors {
            Some(path) => existing(path)?,
            None => existing(&index.find(COLORS_DIR_NAME)?.join(COLORS_FILENAME))?,
        };

        let font = match &overrides.font {
            Some(path) => existing(path)?,
            None => first_file(index.find(FONT_DIR_NAME)?, FONT_EXTENSIONS, "font")?,
        };

        let layout = Self {
            transcript,
            photos,
            audio,
            colors,
            font,
        };
        log::debug!("Resolved project layout: {layout:?}");
        Ok(layout)
    }
}

/// Shallowest directory for each name under a root, built in one walk.
struct DirectoryIndex {
    root: PathBuf,
    dirs: HashMap<String, PathBuf>,
}

impl DirectoryIndex {
    fn build(root: &Path) -> Result<Self, LayoutError> {
        if !root.is_dir() {
            return Err(LayoutError::MissingPath(root.to_path_buf()));
        }
        let mut dirs = HashMap::new();
        // Sorted walk, so ties at equal depth go to the first name.
        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|e| LayoutError::Io {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                let depth = entry.depth();
                dirs.entry(name.to_string())
                    .and_modify(|(d, p): &mut (usize, PathBuf)| {
                        if depth < *d {
                            *d = depth;
                            *p = entry.path().to_path_buf();
                        }
                    })
                    .or_insert_with(|| (depth, entry.path().to_path_buf()));
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            dirs: dirs.into_iter().map(|(name, (_, path))| (name, path)).collect(),
        })
    }

    fn find(&self, name: &'static str) -> Result<&Path, LayoutError> {
        self.dirs
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| LayoutError::MissingDirectory {
                name,
                root: self.root.clone(),
            })
    }
}

/// The root itself is never hidden; temp directories often start with a dot.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn existing(path: &Path) -> Result<PathBuf, LayoutError> {
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(LayoutError::MissingPath(path.to_path_buf()))
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Regular files directly inside `dir` with one of `extensions`, sorted by name.
pub fn files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, LayoutError> {
    let io_err = |source| LayoutError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn first_file(dir: &Path, extensions: &[&str], what: &'static str) -> Result<PathBuf, LayoutError> {
    files_with_extensions(dir, extensions)?
        .into_iter()
        .next()
        .ok_or_else(|| LayoutError::NoFiles {
            what,
            dir: dir.to_path_buf(),
        })
}

/// The most recently modified matching file; narration gets re-recorded and
/// the latest take wins.
fn newest_file(dir: &Path, extensions: &[&str]) -> Result<PathBuf, LayoutError> {
    files_with_extensions(dir, extensions)?
        .into_iter()
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
        .ok_or_else(|| LayoutError::NoFiles {
            what: "audio files",
            dir: dir.to_path_buf(),
        })
}
