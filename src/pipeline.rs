//! Unified Pipeline for Trajectory Dataset Preparation
//!
//! This module connects all components:
//! - Ingestion (dialect-specific readers)
//! - Validation (shape, finiteness, frame ordering)
//! - Scale estimation over the full dataset
//! - Normalization of positions and velocities
//! - Supervised windowing per agent
//!
//! # Architecture
//!
//! ```text
//! files ─► TrajectoryReader ─► TrajectorySet ─► TrajectoryValidator
//!                                   │
//!                 ┌─────────────────┴──────────────────┐
//!                 ▼ (per agent, parallel)              │
//!          ScaleEstimator ──merge──► finalize() ─► Scale
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼ (per agent, parallel)
//!          normalize ─► series ─► SupervisedWindower ─► SupervisedTable
//! ```
//!
//! # Two Passes
//!
//! The scale must cover every position of every agent before any agent is
//! normalized, so the pipeline runs two passes over the data: one to
//! accumulate the extent, one to transform. Both passes are parallel across
//! agents; the extent merge is order-independent, so results do not depend
//! on thread scheduling.
//!
//! # Example
//!
//! ```ignore
//! use trajectory_extractor::prelude::*;
//!
//! let config = PipelineConfig::new(DatasetFormat::Biwi)
//!     .with_window(WindowConfig::new(8, 12));
//! let pipeline = Pipeline::from_config(config)?;
//!
//! let output = pipeline.process("data/biwi/obsmat_*.txt")?;
//! let table = output.to_table()?;
//! ```

use crate::config::PipelineConfig;
use crate::error::{Result, TrajectoryError};
use crate::ingest::{AgentTrajectory, TrajectoryReader, TrajectorySet};
use crate::preprocessing::{Scale, ScaleEstimator};
use crate::sequence_builder::{SupervisedTable, SupervisedWindower};
use crate::validation::TrajectoryValidator;
use rayon::prelude::*;

/// Summary counters of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Agents processed
    pub agents: usize,

    /// Raw samples across all agents
    pub raw_samples: usize,

    /// Supervised samples produced
    pub supervised_samples: usize,

    /// Agents too short to produce any supervised sample
    pub short_agents: usize,

    /// Validation warnings emitted
    pub validation_warnings: usize,
}

/// Output from pipeline processing
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Normalized trajectories, in input order
    pub trajectories: TrajectorySet,

    /// Transform used; invert predictions with `scale.denormalize`
    pub scale: Scale,

    /// Supervised samples, one table per agent (same order as `trajectories`)
    pub tables: Vec<SupervisedTable>,

    /// Run counters
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// Total supervised samples across agents.
    pub fn total_samples(&self) -> usize {
        self.stats.supervised_samples
    }

    /// Effective frame rate of the trajectories.
    pub fn fps(&self) -> f64 {
        self.trajectories.fps
    }

    /// Stack every agent's samples into one table.
    pub fn to_table(&self) -> Result<SupervisedTable> {
        SupervisedTable::concat(&self.tables)
    }
}

/// Main Pipeline - connects all components
pub struct Pipeline {
    config: PipelineConfig,
    reader: Box<dyn TrajectoryReader>,
    validator: TrajectoryValidator,
    windower: SupervisedWindower,
}

impl Pipeline {
    /// Create pipeline from configuration
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(TrajectoryError::Config)?;

        tracing::debug!(
            format = ?config.dataset.format,
            n_vars = config.n_vars(),
            columns = config.window.n_columns(config.n_vars()),
            "pipeline configured"
        );

        Ok(Self {
            reader: config.dataset.reader(),
            validator: TrajectoryValidator::new(config.validation.clone()),
            windower: SupervisedWindower::new(config.window),
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every file matching `pattern` and process the result.
    pub fn process(&self, pattern: &str) -> Result<PipelineOutput> {
        tracing::info!(reader = self.reader.name(), pattern, "reading trajectories");
        let set = self.reader.read_pattern(pattern)?;
        self.process_set(set)
    }

    /// Process trajectories already in memory.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::Validation`] if an agent fails an error-level check
    /// - [`TrajectoryError::EmptyExtent`] / [`TrajectoryError::DegenerateExtent`]
    ///   if no usable scale can be derived from the positions
    pub fn process_set(&self, set: TrajectorySet) -> Result<PipelineOutput> {
        let validation_warnings = self.validate(&set)?;

        let scale = self.estimate_scale(&set.agents)?;
        tracing::info!(
            agents = set.len(),
            samples = set.total_samples(),
            sx = scale.factors().sx,
            sy = scale.factors().sy,
            "scale estimated"
        );

        let agents = set
            .agents
            .par_iter()
            .map(|agent| self.normalize_agent(&scale, agent))
            .collect::<Result<Vec<_>>>()?;

        let include_velocity = self.config.include_velocity;
        let tables = agents
            .par_iter()
            .map(|agent| self.windower.transform(&agent.series(include_velocity)?))
            .collect::<Result<Vec<_>>>()?;

        let stats = PipelineStats {
            agents: agents.len(),
            raw_samples: set.total_samples(),
            supervised_samples: tables.iter().map(SupervisedTable::n_rows).sum(),
            short_agents: tables.iter().filter(|t| t.is_empty()).count(),
            validation_warnings,
        };
        tracing::info!(
            supervised = stats.supervised_samples,
            short_agents = stats.short_agents,
            "windowing complete"
        );

        Ok(PipelineOutput {
            trajectories: TrajectorySet {
                agents,
                fps: set.fps,
            },
            scale,
            tables,
            stats,
        })
    }

    /// Run the validator on every agent; returns the warning count.
    fn validate(&self, set: &TrajectorySet) -> Result<usize> {
        let mut warnings = 0;
        for agent in &set.agents {
            let result = self.validator.validate(agent);

            if let Some(message) = result.errors().next() {
                return Err(TrajectoryError::Validation {
                    agent: agent.id.clone(),
                    message,
                });
            }
            for warning in result.warnings() {
                tracing::warn!(agent = %agent.id, "{warning}");
                warnings += 1;
            }
        }
        Ok(warnings)
    }

    /// Accumulate per-agent extents in parallel and merge them.
    fn estimate_scale(&self, agents: &[AgentTrajectory]) -> Result<Scale> {
        let estimator = agents
            .par_iter()
            .map(|agent| -> Result<ScaleEstimator> {
                let mut estimator = ScaleEstimator::new();
                estimator.accumulate(&agent.positions)?;
                Ok(estimator)
            })
            .try_reduce(ScaleEstimator::new, |mut left, right| {
                left.merge(&right);
                Ok(left)
            })?;

        estimator.finalize(self.config.scale.keep_ratio)
    }

    fn normalize_agent(&self, scale: &Scale, agent: &AgentTrajectory) -> Result<AgentTrajectory> {
        let positions = scale.normalize(&agent.positions, true)?;
        let velocities = if self.config.scale.normalize_velocity {
            scale.normalize(&agent.velocities, false)?
        } else {
            agent.velocities.clone()
        };

        Ok(AgentTrajectory {
            id: agent.id.clone(),
            timestamps: agent.timestamps.clone(),
            positions,
            velocities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetFormat;
    use crate::sequence_builder::WindowConfig;
    use ndarray::{array, Array2};

    fn agent(id: &str, points: &[[f64; 2]]) -> AgentTrajectory {
        let n = points.len();
        let flat: Vec<f64> = points.iter().flatten().copied().collect();
        AgentTrajectory {
            id: id.to_string(),
            timestamps: (0..n).map(|t| t as f64).collect(),
            positions: Array2::from_shape_vec((n, 2), flat).unwrap(),
            velocities: Array2::from_elem((n, 2), 1.0),
        }
    }

    fn two_agents() -> TrajectorySet {
        TrajectorySet {
            agents: vec![
                agent("a", &[[0.0, 0.0], [2.0, 1.0], [4.0, 2.0], [6.0, 3.0]]),
                agent("b", &[[10.0, 5.0], [8.0, 4.0]]),
            ],
            fps: 2.5,
        }
    }

    #[test]
    fn test_pipeline_from_invalid_config() {
        let config =
            PipelineConfig::new(DatasetFormat::Biwi).with_window(WindowConfig::new(0, 0));
        assert!(matches!(
            Pipeline::from_config(config),
            Err(TrajectoryError::Config(_))
        ));
    }

    #[test]
    fn test_scale_covers_all_agents() {
        let pipeline = Pipeline::from_config(PipelineConfig::new(DatasetFormat::Biwi)).unwrap();
        let output = pipeline.process_set(two_agents()).unwrap();

        let extent = output.scale.extent();
        assert_eq!((extent.min_x, extent.max_x), (0.0, 10.0));
        assert_eq!((extent.min_y, extent.max_y), (0.0, 5.0));

        // Every normalized position lands in the unit square
        for a in &output.trajectories.agents {
            assert!(a.positions.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }

        // Velocities scaled but not shifted
        let v = &output.trajectories.agents[0].velocities;
        assert!((v[[0, 0]] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_windows_per_agent() {
        let config = PipelineConfig::new(DatasetFormat::Biwi).with_window(WindowConfig::new(2, 1));
        let output = Pipeline::from_config(config)
            .unwrap()
            .process_set(two_agents())
            .unwrap();

        assert_eq!(output.tables.len(), 2);
        assert_eq!(output.tables[0].n_rows(), 2);
        assert!(output.tables[1].is_empty());
        assert_eq!(output.stats.short_agents, 1);
        assert_eq!(output.total_samples(), 2);
        assert_eq!(output.to_table().unwrap().n_cols(), 6);

        // anchor 1 of agent a: history (0,0),(0.2,0.1); displacement (0.2,0.1)
        let row = output.tables[0].row(0).to_vec();
        let expected = [0.0, 0.0, 0.2, 0.1, 0.2, 0.1];
        for (a, b) in row.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_velocity_columns() {
        let config = PipelineConfig::new(DatasetFormat::Biwi)
            .with_window(WindowConfig::new(1, 1))
            .with_velocity(true);
        let expected = config.window.n_columns(config.n_vars());
        let output = Pipeline::from_config(config)
            .unwrap()
            .process_set(two_agents())
            .unwrap();
        assert_eq!(expected, 8);
        assert_eq!(output.tables[0].n_cols(), expected);
    }

    #[test]
    fn test_empty_set_fails() {
        let pipeline = Pipeline::from_config(PipelineConfig::new(DatasetFormat::Biwi)).unwrap();
        assert!(matches!(
            pipeline.process_set(TrajectorySet::default()),
            Err(TrajectoryError::EmptyExtent)
        ));
    }

    #[test]
    fn test_invalid_agent_fails() {
        let mut set = two_agents();
        set.agents[1].positions = array![[f64::NAN, 1.0], [2.0, 3.0]];

        let pipeline = Pipeline::from_config(PipelineConfig::new(DatasetFormat::Biwi)).unwrap();
        match pipeline.process_set(set) {
            Err(TrajectoryError::Validation { agent, .. }) => assert_eq!(agent, "b"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }
}
