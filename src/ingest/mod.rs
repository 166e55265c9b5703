//! Raw trajectory ingestion.
//!
//! Readers turn lab recordings into per-agent trajectories. Each dataset
//! dialect has its own reader; everything downstream only sees the common
//! [`AgentTrajectory`] shape:
//!
//! ```text
//! files ──expand_pattern()──► [path, ...] ──TrajectoryReader──► TrajectorySet
//!                                                                 └─ AgentTrajectory
//!                                                                      ├─ timestamps [T]
//!                                                                      ├─ positions  [T × 2]
//!                                                                      └─ velocities [T × 2]
//! ```
//!
//! # Dialects
//!
//! | Reader | Layout | Units | Default down-sampling |
//! |--------|--------|-------|-----------------------|
//! | [`BiwiReader`] | 8 whitespace-separated columns | metres | 1 |
//! | [`SeyfriedReader`] | header block + 5 columns | centimetres | 4 |

pub mod biwi;
pub mod discovery;
pub mod seyfried;

pub use biwi::BiwiReader;
pub use discovery::expand_pattern;
pub use seyfried::{SeyfriedReader, VelocityMode};

use crate::error::{Result, TrajectoryError};
use ahash::AHashMap;
use ndarray::{concatenate, Array2, Axis};
use std::path::Path;

/// Time-ordered samples of a single agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTrajectory {
    /// Agent identifier as written in the source file
    pub id: String,

    /// Frame timestamps, one per row
    pub timestamps: Vec<f64>,

    /// Positions `[T × 2]` (x, y)
    pub positions: Array2<f64>,

    /// Velocities `[T × 2]` (vx, vy), row-aligned with `positions`
    pub velocities: Array2<f64>,
}

impl AgentTrajectory {
    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    /// True if the agent has no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the per-timestep series fed to the windower.
    ///
    /// Columns are `[x, y]`, or `[x, y, vx, vy]` when `include_velocity`.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::ShapeMismatch`] if positions and velocities have a
    /// different number of rows.
    pub fn series(&self, include_velocity: bool) -> Result<Array2<f64>> {
        if !include_velocity {
            return Ok(self.positions.clone());
        }
        concatenate(Axis(1), &[self.positions.view(), self.velocities.view()]).map_err(|e| {
            TrajectoryError::ShapeMismatch(format!(
                "agent {}: positions {:?} vs velocities {:?}: {e}",
                self.id,
                self.positions.shape(),
                self.velocities.shape()
            ))
        })
    }
}

/// All agents read from one or more files of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectorySet {
    /// Agents in first-appearance order
    pub agents: Vec<AgentTrajectory>,

    /// Effective frame rate after down-sampling
    pub fps: f64,
}

impl TrajectorySet {
    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True if no agent was read.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Total samples across all agents.
    pub fn total_samples(&self) -> usize {
        self.agents.iter().map(AgentTrajectory::len).sum()
    }

    /// Append the agents of another set; the frame rate of `other` wins.
    pub fn merge(&mut self, other: TrajectorySet) {
        self.agents.extend(other.agents);
        self.fps = other.fps;
    }
}

/// Reader for one on-disk dataset dialect.
pub trait TrajectoryReader: Send + Sync {
    /// Short dialect name for logging.
    fn name(&self) -> &'static str;

    /// Parse file contents. `path` is only used for error messages.
    fn parse(&self, content: &str, path: &Path) -> Result<TrajectorySet>;

    /// Read and parse a single file.
    fn read_file(&self, path: &Path) -> Result<TrajectorySet> {
        let content = std::fs::read_to_string(path)?;
        let set = self.parse(&content, path)?;
        tracing::debug!(
            reader = self.name(),
            path = %path.display(),
            agents = set.len(),
            samples = set.total_samples(),
            "read trajectory file"
        );
        Ok(set)
    }

    /// Read every file matching a `*` pattern (see [`expand_pattern`]).
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::Parse`] if nothing matches, plus any read error.
    fn read_pattern(&self, pattern: &str) -> Result<TrajectorySet> {
        let files = expand_pattern(pattern)?;
        if files.is_empty() {
            return Err(TrajectoryError::parse(pattern, 0, "no files match pattern"));
        }

        let mut set = TrajectorySet::default();
        for file in &files {
            set.merge(self.read_file(file)?);
        }
        Ok(set)
    }
}

/// Incremental per-agent sample collector shared by the readers.
#[derive(Debug, Default)]
pub(crate) struct TrackCollector {
    order: Vec<TrackBuffer>,
    index: AHashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) struct TrackBuffer {
    id: String,
    timestamps: Vec<f64>,
    positions: Vec<f64>,
    velocities: Vec<f64>,
}

impl TrackBuffer {
    /// Timestamp and position of the first sample.
    pub(crate) fn first(&self) -> Option<(f64, [f64; 2])> {
        let t = *self.timestamps.first()?;
        Some((t, [self.positions[0], self.positions[1]]))
    }

    /// Timestamp and position of the latest sample.
    pub(crate) fn last(&self) -> Option<(f64, [f64; 2])> {
        let t = *self.timestamps.last()?;
        let n = self.positions.len();
        Some((t, [self.positions[n - 2], self.positions[n - 1]]))
    }

    pub(crate) fn push(&mut self, timestamp: f64, position: [f64; 2], velocity: [f64; 2]) {
        self.timestamps.push(timestamp);
        self.positions.extend_from_slice(&position);
        self.velocities.extend_from_slice(&velocity);
    }

    fn build(self) -> Result<AgentTrajectory> {
        let n = self.timestamps.len();
        let shape_err = |e: ndarray::ShapeError| TrajectoryError::ShapeMismatch(e.to_string());
        Ok(AgentTrajectory {
            positions: Array2::from_shape_vec((n, 2), self.positions).map_err(shape_err)?,
            velocities: Array2::from_shape_vec((n, 2), self.velocities).map_err(shape_err)?,
            id: self.id,
            timestamps: self.timestamps,
        })
    }
}

impl TrackCollector {
    /// Buffer for `id`, created on first sight.
    pub(crate) fn track(&mut self, id: &str) -> &mut TrackBuffer {
        let next = self.order.len();
        let slot = *self.index.entry(id.to_string()).or_insert(next);
        if slot == next {
            self.order.push(TrackBuffer {
                id: id.to_string(),
                timestamps: Vec::new(),
                positions: Vec::new(),
                velocities: Vec::new(),
            });
        }
        &mut self.order[slot]
    }

    pub(crate) fn finish(self, fps: f64) -> Result<TrajectorySet> {
        let agents = self
            .order
            .into_iter()
            .map(TrackBuffer::build)
            .collect::<Result<Vec<_>>>()?;
        Ok(TrajectorySet { agents, fps })
    }
}

/// Parse a numeric token, reporting the column on failure.
pub(crate) fn parse_field(token: &str, column: &str, path: &Path, line: usize) -> Result<f64> {
    token.parse::<f64>().map_err(|e| {
        TrajectoryError::parse(path, line, format!("invalid {column} value {token:?}: {e}"))
    })
}
