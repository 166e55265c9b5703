//! Reader for Seyfried corridor/bottleneck experiment files.
//!
//! # Layout
//!
//! ```text
//! line 1   number of obstacles
//! line 2   obstacle segments: x1 y1 x2 y2 ...
//! line 3   (unused)
//! line 4   recording frame rate
//! line 5+  agent_id frame pos_x pos_y pos_z     (centimetres)
//! ```
//!
//! Only rows after the header with exactly five tokens are data. Positions are converted to
//! metres and the height column is dropped.
//!
//! # Velocity
//!
//! The files carry no velocity, so it is reconstructed by finite differences
//! against a reference sample of the same agent:
//!
//! ```text
//! v = (p - p_ref) * fps / (t - t_ref + EPS)
//! ```
//!
//! `t` is in frames and `fps` is the recording rate, so `v` is in metres per
//! second. See [`VelocityMode`] for the choice of reference.

use super::{parse_field, TrackCollector, TrajectoryReader, TrajectorySet};
use crate::error::{Result, TrajectoryError};
use crate::preprocessing::DownSampler;
use std::path::Path;

/// 1-based line holding the recording frame rate.
const FPS_LINE: usize = 4;

const ROW_WIDTH: usize = 5;

const CM_PER_M: f64 = 100.0;

/// Reference sample for finite-difference velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum VelocityMode {
    /// Average velocity since the agent's first kept sample.
    #[default]
    FromTrackStart,

    /// Velocity since the previous kept sample.
    Instantaneous,
}

/// Seyfried dialect reader.
#[derive(Debug, Clone)]
pub struct SeyfriedReader {
    down_sample: usize,
    velocity: VelocityMode,
}

impl SeyfriedReader {
    /// Create a reader keeping frames whose number is a multiple of `down_sample`.
    pub fn new(down_sample: usize) -> Self {
        Self {
            down_sample: down_sample.max(1),
            velocity: VelocityMode::default(),
        }
    }

    /// Set the velocity reconstruction mode.
    pub fn with_velocity_mode(mut self, mode: VelocityMode) -> Self {
        self.velocity = mode;
        self
    }

    /// Configured down-sampling step.
    pub fn down_sample(&self) -> usize {
        self.down_sample
    }

    /// Configured velocity mode.
    pub fn velocity_mode(&self) -> VelocityMode {
        self.velocity
    }
}

impl Default for SeyfriedReader {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TrajectoryReader for SeyfriedReader {
    fn name(&self) -> &'static str {
        "seyfried"
    }

    fn parse(&self, content: &str, path: &Path) -> Result<TrajectorySet> {
        let mut sampler = DownSampler::new(self.down_sample);
        let mut tracks = TrackCollector::default();
        let mut recording_fps: Option<f64> = None;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();

            if line_no == FPS_LINE {
                let token = tokens.first().ok_or_else(|| {
                    TrajectoryError::parse(path, line_no, "missing frame rate")
                })?;
                recording_fps = Some(parse_field(token, "frame rate", path, line_no)?);
            }

            if line_no <= FPS_LINE || tokens.len() != ROW_WIDTH {
                continue;
            }

            let fps = recording_fps.ok_or_else(|| {
                TrajectoryError::parse(path, line_no, "data row before frame rate header")
            })?;

            let ts = parse_field(tokens[1], "frame", path, line_no)?;
            if !sampler.should_sample(ts) {
                continue;
            }

            let px = parse_field(tokens[2], "pos_x", path, line_no)? / CM_PER_M;
            let py = parse_field(tokens[3], "pos_y", path, line_no)? / CM_PER_M;
            parse_field(tokens[4], "pos_z", path, line_no)?;

            let track = tracks.track(tokens[0]);
            let reference = match self.velocity {
                VelocityMode::FromTrackStart => track.first(),
                VelocityMode::Instantaneous => track.last(),
            };
            let (t_ref, [rx, ry]) = reference.unwrap_or((ts, [px, py]));

            let rate = fps / (ts - t_ref + f64::EPSILON);
            track.push(ts, [px, py], [(px - rx) * rate, (py - ry) * rate]);
        }

        let fps = recording_fps
            .ok_or_else(|| TrajectoryError::parse(path, FPS_LINE, "missing frame rate header"))?;

        let (seen, kept) = sampler.statistics();
        tracing::debug!(path = %path.display(), fps, seen, kept, "seyfried frames sampled");

        tracks.finish(sampler.effective_fps(fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1
0 0 100 0
0
16
1 0 100 200 170
1 4 116 200 170
1 8 148 232 170
2 4 0 0 160
";

    #[test]
    fn test_parse_units_and_fps() {
        let set = SeyfriedReader::default()
            .parse(SAMPLE, Path::new("run.sey"))
            .unwrap();

        assert!((set.fps - 4.0).abs() < 1e-12);
        assert_eq!(set.len(), 2);

        let a = &set.agents[0];
        assert_eq!(a.id, "1");
        assert_eq!(a.timestamps, vec![0.0, 4.0, 8.0]);
        assert!((a.positions[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((a.positions[[2, 1]] - 2.32).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_from_track_start() {
        let set = SeyfriedReader::default()
            .parse(SAMPLE, Path::new("run.sey"))
            .unwrap();
        let a = &set.agents[0];

        // First sample has no displacement
        assert_eq!(a.velocities.row(0).to_vec(), vec![0.0, 0.0]);
        // 0.16 m over 4 frames at 16 fps = 0.64 m/s
        assert!((a.velocities[[1, 0]] - 0.64).abs() < 1e-9);
        assert!(a.velocities[[1, 1]].abs() < 1e-9);
        // 0.48 m / 0.32 m over 8 frames from start
        assert!((a.velocities[[2, 0]] - 0.96).abs() < 1e-9);
        assert!((a.velocities[[2, 1]] - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_instantaneous() {
        let set = SeyfriedReader::default()
            .with_velocity_mode(VelocityMode::Instantaneous)
            .parse(SAMPLE, Path::new("run.sey"))
            .unwrap();
        let a = &set.agents[0];

        // 0.32 m / 0.32 m over the last 4 frames
        assert!((a.velocities[[2, 0]] - 1.28).abs() < 1e-9);
        assert!((a.velocities[[2, 1]] - 1.28).abs() < 1e-9);
    }

    #[test]
    fn test_down_sampling_changes_fps() {
        let set = SeyfriedReader::new(8)
            .parse(SAMPLE, Path::new("run.sey"))
            .unwrap();
        assert!((set.fps - 2.0).abs() < 1e-12);
        assert_eq!(set.agents[0].timestamps, vec![0.0, 8.0]);
        // agent 2 only appears on frame 4
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_missing_fps_header() {
        let content = "1\n0 0 1 1\n";
        assert!(matches!(
            SeyfriedReader::default().parse(content, Path::new("short.sey")),
            Err(TrajectoryError::Parse { .. })
        ));
    }

    #[test]
    fn test_bad_fps_value() {
        let content = "1\n0 0 1 1\n0\nfast\n";
        match SeyfriedReader::default().parse(content, Path::new("bad.sey")) {
            Err(TrajectoryError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
