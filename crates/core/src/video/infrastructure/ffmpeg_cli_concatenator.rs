use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::shared::constants::CONCAT_MANIFEST_FILENAME;
use crate::shared::error::BoxError;
use crate::video::domain::segment_concatenator::SegmentConcatenator;

#[derive(Debug, thiserror::Error)]
pub enum ConcatError {
    #[error("no segments to concatenate")]
    NoSegments,
    #[error("failed to write concat manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}:\n{stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Joins segments with the ffmpeg concat demuxer, re-encoding to H.264/AAC so
/// segments with slightly different encoder settings still line up.
pub struct FfmpegCliConcatenator {
    ffmpeg_binary: String,
}

impl FfmpegCliConcatenator {
    pub fn new(ffmpeg_binary: impl Into<String>) -> Self {
        Self {
            ffmpeg_binary: ffmpeg_binary.into(),
        }
    }

    /// Concat demuxer manifest, one `file '<path>'` line per segment.
    ///
    /// Single quotes cannot appear inside a quoted token, so each one closes
    /// the quote, emits an escaped quote and reopens it.
    pub fn manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|p| {
                let escaped = p.to_string_lossy().replace('\'', r"'\''");
                format!("file '{escaped}'\n")
            })
            .collect()
    }

    fn command_line(&self, manifest: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            manifest.to_string_lossy().into_owned(),
            "-c:v".into(),
            "libx264".into(),
            "-c:a".into(),
            "aac".into(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegCliConcatenator {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// The demuxer resolves relative entries against the manifest's directory,
/// so entries are made absolute first.
fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl SegmentConcatenator for FfmpegCliConcatenator {
    fn concatenate(&self, segments: &[PathBuf], output: &Path) -> Result<(), BoxError> {
        if segments.is_empty() {
            return Err(ConcatError::NoSegments.into());
        }

        let manifest_path = output
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONCAT_MANIFEST_FILENAME);
        let entries: Vec<PathBuf> = segments.iter().map(|p| absolute(p)).collect();
        fs::write(&manifest_path, Self::manifest(&entries)).map_err(|source| {
            ConcatError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;

        let args = self.command_line(&manifest_path, output);
        let command = format!("{} {}", self.ffmpeg_binary, args.join(" "));
        log::info!("Concatenating {} segments into {}", segments.len(), output.display());
        log::debug!("Running {command}");

        let result = Command::new(&self.ffmpeg_binary).args(&args).output();
        let out = match result {
            Ok(out) => out,
            Err(source) => {
                log::error!("Could not start {command}: {source}");
                return Err(ConcatError::Spawn { command, source }.into());
            }
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
            log::error!("{command} failed with {}\n{stderr}", out.status);
            return Err(ConcatError::Failed {
                command,
                status: out.status,
                stderr,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::media_probe::MediaProbe;
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_probe::FfmpegProbe;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
    use approx::assert_abs_diff_eq;

    fn ffmpeg_available() -> bool {
        Command::new("ffmpeg").arg("-version").output().is_ok()
    }

    fn write_clip(path: &Path, frames: usize) {
        let metadata = VideoMetadata {
            width: 64,
            height: 64,
            fps: 30,
            total_frames: frames,
        };
        let mut writer = FfmpegWriter::new();
        writer.open(path, &metadata).unwrap();
        for i in 0..frames {
            writer.write(&Frame::new(vec![30; 64 * 64 * 3], 64, 64, i)).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_manifest_lists_segments_in_order() {
        let segments = vec![
            PathBuf::from("/work/segment_0.mp4"),
            PathBuf::from("/work/segment_1.mp4"),
            PathBuf::from("/work/segment_10.mp4"),
        ];
        let manifest = FfmpegCliConcatenator::manifest(&segments);
        assert_eq!(
            manifest,
            "file '/work/segment_0.mp4'\nfile '/work/segment_1.mp4'\nfile '/work/segment_10.mp4'\n"
        );
    }

    #[test]
    fn test_manifest_escapes_single_quotes() {
        let manifest = FfmpegCliConcatenator::manifest(&[PathBuf::from("/it's/segment_0.mp4")]);
        assert_eq!(manifest, "file '/it'\\''s/segment_0.mp4'\n");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FfmpegCliConcatenator::default()
            .concatenate(&[], &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("no segments"));
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let segment = dir.path().join("segment_0.mp4");
        fs::write(&segment, b"").unwrap();
        let concatenator = FfmpegCliConcatenator::new("/nonexistent/ffmpeg");
        let err = concatenator
            .concatenate(&[segment], &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConcatError>(),
            Some(ConcatError::Spawn { .. })
        ));
        assert!(dir.path().join(CONCAT_MANIFEST_FILENAME).exists());
    }

    #[test]
    fn test_corrupt_segment_reports_stderr() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg binary not found, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let segment = dir.path().join("segment_0.mp4");
        fs::write(&segment, b"not a video").unwrap();
        let err = FfmpegCliConcatenator::default()
            .concatenate(&[segment], &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConcatError>(),
            Some(ConcatError::Failed { .. })
        ));
    }

    #[test]
    fn test_concatenated_duration_is_sum_of_segments() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg binary not found, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("segment_0.mp4");
        let second = dir.path().join("segment_1.mp4");
        write_clip(&first, 30);
        write_clip(&second, 45);
        let output = dir.path().join("final_video.mp4");

        FfmpegCliConcatenator::default()
            .concatenate(&[first, second], &output)
            .unwrap();

        let duration = FfmpegProbe.duration(&output).unwrap();
        assert_abs_diff_eq!(duration, 2.5, epsilon = 0.1);
    }
}
