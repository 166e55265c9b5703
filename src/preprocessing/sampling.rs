//! Stride-based temporal down-sampling.
//!
//! Recordings are often captured at a higher frame rate than a prediction
//! model needs. Down-sampling keeps only the frames whose timestamp is an
//! exact multiple of a configured step:
//!
//! ```text
//! step = 4:   t = 0  1  2  3  4  5  6  7  8
//!                 ✓           ✓           ✓
//! ```
//!
//! Frames are selected by timestamp value, not by arrival order, so every
//! agent in a recording is sampled on the same global time grid.
//!
//! No interpolation or resampling happens here: dropped frames are simply
//! skipped.

/// Timestamp-grid down-sampler.
///
/// # Example
///
/// ```
/// use trajectory_extractor::preprocessing::DownSampler;
///
/// let mut sampler = DownSampler::new(4);
/// let kept: Vec<f64> = [0.0, 1.0, 4.0, 6.0, 8.0]
///     .into_iter()
///     .filter(|&t| sampler.should_sample(t))
///     .collect();
/// assert_eq!(kept, vec![0.0, 4.0, 8.0]);
/// ```
#[derive(Debug, Clone)]
pub struct DownSampler {
    /// Keep timestamps that are multiples of this step
    step: usize,

    /// Frames offered
    seen: u64,

    /// Frames kept
    kept: u64,
}

impl DownSampler {
    /// Create a down-sampler.
    ///
    /// A step of 0 is treated as 1 (keep everything).
    #[inline]
    pub fn new(step: usize) -> Self {
        Self {
            step: step.max(1),
            seen: 0,
            kept: 0,
        }
    }

    /// Check whether the frame at `timestamp` falls on the sampling grid.
    ///
    /// Non-finite timestamps are never sampled.
    #[inline]
    pub fn should_sample(&mut self, timestamp: f64) -> bool {
        self.seen += 1;

        let keep = timestamp.is_finite() && timestamp % self.step as f64 == 0.0;
        if keep {
            self.kept += 1;
        }
        keep
    }

    /// Configured step.
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Frame rate after down-sampling, given the recording rate.
    #[inline]
    pub fn effective_fps(&self, recording_fps: f64) -> f64 {
        recording_fps / self.step as f64
    }

    /// Returns (frames_seen, frames_kept).
    pub fn statistics(&self) -> (u64, u64) {
        (self.seen, self.kept)
    }
}

impl Default for DownSampler {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_one_keeps_integer_frames() {
        let mut sampler = DownSampler::default();
        assert!(sampler.should_sample(0.0));
        assert!(sampler.should_sample(1.0));
        assert!(sampler.should_sample(17.0));
        // Fractional timestamps are off-grid even with step 1
        assert!(!sampler.should_sample(2.5));
        assert_eq!(sampler.statistics(), (4, 3));
    }

    #[test]
    fn test_grid_selection() {
        let mut sampler = DownSampler::new(10);
        let kept: Vec<f64> = (0..35)
            .map(|t| t as f64)
            .filter(|&t| sampler.should_sample(t))
            .collect();
        assert_eq!(kept, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_zero_step_clamped() {
        let sampler = DownSampler::new(0);
        assert_eq!(sampler.step(), 1);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut sampler = DownSampler::new(2);
        assert!(!sampler.should_sample(f64::NAN));
        assert!(!sampler.should_sample(f64::INFINITY));
    }

    #[test]
    fn test_effective_fps() {
        let sampler = DownSampler::new(4);
        assert!((sampler.effective_fps(16.0) - 4.0).abs() < 1e-12);
        assert_eq!(sampler.statistics(), (0, 0));
    }
}
