//! Reader for BIWI-style observation matrices.
//!
//! Each data row holds eight whitespace-separated values:
//!
//! ```text
//! frame  agent_id  pos_x  pos_z  pos_y  vel_x  vel_z  vel_y
//!   0        1     -6.31   0.00   4.67   1.13   0.00  -0.24
//! ```
//!
//! Only the ground-plane components (columns 2, 4 for position, 5, 7 for
//! velocity) are kept. Velocities are taken as recorded. Rows with any other
//! token count are ignored. The recordings are annotated at 2.5 fps.

use super::{parse_field, TrackCollector, TrajectoryReader, TrajectorySet};
use crate::error::Result;
use crate::preprocessing::DownSampler;
use std::path::Path;

/// Annotation frame rate of the BIWI recordings.
pub const BIWI_FPS: f64 = 2.5;

const ROW_WIDTH: usize = 8;

/// BIWI dialect reader.
#[derive(Debug, Clone)]
pub struct BiwiReader {
    down_sample: usize,
}

impl BiwiReader {
    /// Create a reader keeping frames whose number is a multiple of `down_sample`.
    pub fn new(down_sample: usize) -> Self {
        Self {
            down_sample: down_sample.max(1),
        }
    }

    /// Configured down-sampling step.
    pub fn down_sample(&self) -> usize {
        self.down_sample
    }
}

impl Default for BiwiReader {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TrajectoryReader for BiwiReader {
    fn name(&self) -> &'static str {
        "biwi"
    }

    fn parse(&self, content: &str, path: &Path) -> Result<TrajectorySet> {
        let mut sampler = DownSampler::new(self.down_sample);
        let mut tracks = TrackCollector::default();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != ROW_WIDTH {
                continue;
            }

            let ts = parse_field(tokens[0], "frame", path, line_no)?;
            if !sampler.should_sample(ts) {
                continue;
            }

            let id = parse_field(tokens[1], "agent id", path, line_no)?.round() as i64;
            let px = parse_field(tokens[2], "pos_x", path, line_no)?;
            let py = parse_field(tokens[4], "pos_y", path, line_no)?;
            let vx = parse_field(tokens[5], "vel_x", path, line_no)?;
            let vy = parse_field(tokens[7], "vel_y", path, line_no)?;

            tracks.track(&id.to_string()).push(ts, [px, py], [vx, vy]);
        }

        let (seen, kept) = sampler.statistics();
        tracing::debug!(path = %path.display(), seen, kept, "biwi frames sampled");

        tracks.finish(BIWI_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrajectoryError;
    use ndarray::array;

    const SAMPLE: &str = "\
  0.0000000e+00   1.0000000e+00  -6.3100000e+00   0.0000000e+00   4.6700000e+00   1.1300000e+00   0.0000000e+00  -2.4000000e-01
  0.0000000e+00   2.0000000e+00   3.0000000e+00   0.0000000e+00   1.0000000e+00   0.0000000e+00   0.0000000e+00   5.0000000e-01
  6.0000000e+00   1.0000000e+00  -5.8500000e+00   0.0000000e+00   4.5700000e+00   1.1500000e+00   0.0000000e+00  -2.5000000e-01
not a data row
  1.2000000e+01   1.0000000e+00  -5.3900000e+00   0.0000000e+00   4.4700000e+00   1.1500000e+00   0.0000000e+00  -2.5000000e-01
";

    #[test]
    fn test_parse_groups_agents() {
        let set = BiwiReader::default()
            .parse(SAMPLE, Path::new("obsmat.txt"))
            .unwrap();

        assert_eq!(set.fps, BIWI_FPS);
        assert_eq!(set.len(), 2);

        let first = &set.agents[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.timestamps, vec![0.0, 6.0, 12.0]);
        assert_eq!(first.positions.row(0).to_vec(), vec![-6.31, 4.67]);
        assert_eq!(first.velocities.row(2).to_vec(), vec![1.15, -0.25]);

        let second = &set.agents[1];
        assert_eq!(second.id, "2");
        assert_eq!(second.positions, array![[3.0, 1.0]]);
        assert_eq!(second.velocities, array![[0.0, 0.5]]);
    }

    #[test]
    fn test_down_sampling() {
        let set = BiwiReader::new(12)
            .parse(SAMPLE, Path::new("obsmat.txt"))
            .unwrap();
        assert_eq!(set.agents[0].timestamps, vec![0.0, 12.0]);
        assert_eq!(set.total_samples(), 3);
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let content = "0 1 2 0 x 0 0 0\n";
        match BiwiReader::default().parse(content, Path::new("bad.txt")) {
            Err(TrajectoryError::Parse { line, message, .. }) => {
                assert_eq!(line, 1);
                assert!(message.contains("pos_y"));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let set = BiwiReader::default().parse("", Path::new("empty.txt")).unwrap();
        assert!(set.is_empty());
    }
}
