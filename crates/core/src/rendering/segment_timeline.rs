use crate::transcript::domain::word_group::WordGroup;

/// Which subtitle band is visible on a frame, and how strongly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayState {
    pub group: usize,
    pub opacity: f32,
}

/// Maps output frame indices to word-group overlays for one segment.
///
/// Each group is visible over its own window and fades in linearly over
/// `fade_in` seconds from the window start.
#[derive(Clone, Debug)]
pub struct SegmentTimeline {
    windows: Vec<(f64, f64)>,
    fps: u32,
    duration: f64,
    fade_in: f64,
}

impl SegmentTimeline {
    pub fn new(groups: &[WordGroup], duration: f64, fps: u32, fade_in: f64) -> Self {
        Self {
            windows: groups
                .iter()
                .map(|g| (g.start_offset, g.end_offset))
                .collect(),
            fps,
            duration,
            fade_in,
        }
    }

    pub fn frame_count(&self) -> usize {
        (self.duration * self.fps as f64).round().max(0.0) as usize
    }

    /// Length of the encoded stream, which is what a probe will report.
    pub fn encoded_duration(&self) -> f64 {
        self.frame_count() as f64 / self.fps as f64
    }

    pub fn frame_time(&self, frame: usize) -> f64 {
        frame as f64 / self.fps as f64
    }

    pub fn overlay_at(&self, frame: usize) -> Option<OverlayState> {
        let t = self.frame_time(frame);
        let last = self.windows.len().checked_sub(1)?;
        // Rounding the frame count up can put the final frame past the last
        // window; it keeps showing the last group.
        let group = self
            .windows
            .iter()
            .position(|&(start, end)| t >= start && t < end)
            .unwrap_or(if t >= self.windows[last].1 { last } else { 0 });

        let since_start = t - self.windows[group].0;
        let opacity = if self.fade_in <= 0.0 {
            1.0
        } else {
            (since_start / self.fade_in).clamp(0.0, 1.0) as f32
        };
        Some(OverlayState { group, opacity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn groups(count: usize, duration: f64) -> Vec<WordGroup> {
        let d = duration / count as f64;
        (0..count)
            .map(|i| WordGroup {
                words: vec![format!("w{i}")],
                start_offset: i as f64 * d,
                end_offset: if i + 1 == count { duration } else { (i + 1) as f64 * d },
            })
            .collect()
    }

    #[rstest]
    #[case(1.0, 30)]
    #[case(2.5, 75)]
    #[case(1.01, 30)]
    #[case(1.02, 31)]
    fn test_frame_count_rounds_duration_times_fps(#[case] duration: f64, #[case] frames: usize) {
        let timeline = SegmentTimeline::new(&groups(1, duration), duration, 30, 0.5);
        assert_eq!(timeline.frame_count(), frames);
    }

    #[test]
    fn test_groups_switch_at_window_boundaries() {
        let timeline = SegmentTimeline::new(&groups(2, 2.0), 2.0, 10, 0.0);
        assert_eq!(timeline.overlay_at(0).unwrap().group, 0);
        assert_eq!(timeline.overlay_at(9).unwrap().group, 0);
        assert_eq!(timeline.overlay_at(10).unwrap().group, 1);
        assert_eq!(timeline.overlay_at(19).unwrap().group, 1);
    }

    #[test]
    fn test_fade_in_ramps_from_each_group_start() {
        let timeline = SegmentTimeline::new(&groups(2, 2.0), 2.0, 10, 0.5);
        assert_relative_eq!(timeline.overlay_at(0).unwrap().opacity, 0.0);
        assert_relative_eq!(timeline.overlay_at(2).unwrap().opacity, 0.4, epsilon = 1e-6);
        assert_relative_eq!(timeline.overlay_at(5).unwrap().opacity, 1.0);
        assert_relative_eq!(timeline.overlay_at(9).unwrap().opacity, 1.0);
        // Second group restarts its fade.
        assert_relative_eq!(timeline.overlay_at(10).unwrap().opacity, 0.0);
        assert_relative_eq!(timeline.overlay_at(13).unwrap().opacity, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_frame_past_last_window_keeps_last_group() {
        let timeline = SegmentTimeline::new(&groups(2, 1.02), 1.02, 30, 0.0);
        let last_frame = timeline.frame_count() - 1;
        assert_eq!(timeline.overlay_at(last_frame).unwrap().group, 1);
        assert_eq!(timeline.overlay_at(last_frame + 5).unwrap().group, 1);
    }

    #[test]
    fn test_no_groups_means_no_overlay() {
        let timeline = SegmentTimeline::new(&[], 1.0, 30, 0.5);
        assert!(timeline.overlay_at(0).is_none());
    }

    #[test]
    fn test_encoded_duration_is_frame_aligned() {
        let timeline = SegmentTimeline::new(&groups(1, 1.01), 1.01, 30, 0.5);
        assert_relative_eq!(timeline.encoded_duration(), 1.0);
    }
}
