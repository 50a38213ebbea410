use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::subtitles::domain::color_map::{ColorMap, ColorMapError, TextColor};

#[derive(Error, Debug)]
pub enum ColorFileError {
    #[error("failed to read color file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: expected 'word, color', got '{definition}'")]
    Malformed {
        path: PathBuf,
        line: usize,
        definition: String,
    },
    #[error("{path}:{line}: {source}")]
    Color {
        path: PathBuf,
        line: usize,
        #[source]
        source: ColorMapError,
    },
}

/// Loads a `colors.txt` file.
///
/// Each line holds `word, color; word, color` definitions. When a line
/// contains double quotes only the first quoted span is read, so lines like
/// `highlight = "sun, gold; sea, blue"` work as well as bare lists.
pub fn read_color_file(path: &Path, default_color: &str) -> Result<ColorMap, ColorFileError> {
    let contents = fs::read_to_string(path).map_err(|e| ColorFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let map = parse_color_definitions(path, &contents, default_color)?;
    log::info!("Loaded {} color mappings from {}", map.len(), path.display());
    Ok(map)
}

pub fn parse_color_definitions(
    path: &Path,
    contents: &str,
    default_color: &str,
) -> Result<ColorMap, ColorFileError> {
    let default = TextColor::parse(default_color).map_err(|e| ColorFileError::Color {
        path: path.to_path_buf(),
        line: 0,
        source: e,
    })?;
    let mut map = ColorMap::new(default);

    for (i, raw_line) in contents.lines().enumerate() {
        let line_no = i + 1;
        let body = quoted_span(raw_line).unwrap_or(raw_line).trim();
        if body.is_empty() {
            continue;
        }

        for definition in body.split(';').map(str::trim).filter(|d| !d.is_empty()) {
            let (word, color) = definition
                .split_once(',')
                .map(|(w, c)| (w.trim(), c.trim()))
                .filter(|(w, c)| !w.is_empty() && !c.is_empty())
                .ok_or_else(|| ColorFileError::Malformed {
                    path: path.to_path_buf(),
                    line: line_no,
                    definition: definition.to_string(),
                })?;

            let parsed = TextColor::parse(color).map_err(|e| ColorFileError::Color {
                path: path.to_path_buf(),
                line: line_no,
                source: e,
            })?;
            map.insert(word, parsed);
        }
    }

    Ok(map)
}

fn quoted_span(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<ColorMap, ColorFileError> {
        parse_color_definitions(Path::new("colors.txt"), contents, "white")
    }

    #[test]
    fn test_quoted_line() {
        let map = parse("colors = \"Hello, red; World, blue\"\n").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("hello").name(), "red");
        assert_eq!(map.resolve("WORLD").name(), "blue");
    }

    #[test]
    fn test_bare_lines_and_blank_lines() {
        let map = parse("sun, gold\n\nsea, #0000ff; sky, skyblue;\n").unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.resolve("sea").rgb(), [0, 0, 255]);
    }

    #[test]
    fn test_malformed_definition_reports_line() {
        let err = parse("sun, gold\nmoon\n").unwrap_err();
        match err {
            ColorFileError::Malformed { line, definition, .. } => {
                assert_eq!(line, 2);
                assert_eq!(definition, "moon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_color_reports_line() {
        let err = parse("\"sun, sunshine\"").unwrap_err();
        assert!(matches!(err, ColorFileError::Color { line: 1, .. }));
    }

    #[test]
    fn test_read_color_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.txt");
        fs::write(&path, "\"hello, red\"").unwrap();
        let map = read_color_file(&path, "white").unwrap();
        assert_eq!(map.resolve("Hello").rgb(), [255, 0, 0]);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            read_color_file(Path::new("/nonexistent/colors.txt"), "white"),
            Err(ColorFileError::Read { .. })
        ));
    }
}
