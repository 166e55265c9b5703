//! Supervised sample generation for trajectory prediction models.
//!
//! Trajectory predictors are trained on pairs of (observed history, future
//! positions). This module turns one contiguous per-agent series into a
//! table of such pairs using a sliding anchor.
//!
//! # Architecture
//!
//! - **WindowConfig**: History/forecast lengths and differencing policy
//! - **SupervisedWindower**: Sliding-window transform, single or batched
//! - **SupervisedTable**: Output samples with column names and anchors
//!
//! # Example
//!
//! ```ignore
//! use trajectory_extractor::sequence_builder::{SupervisedWindower, WindowConfig};
//!
//! // 8 observed steps, predict 12 displacements
//! let windower = SupervisedWindower::new(WindowConfig::new(8, 12));
//!
//! for agent in &trajectories.agents {
//!     let table = windower.transform(&agent.series(false)?)?;
//!     model.fit(table.values());
//! }
//! ```

mod windower;

pub use windower::{SupervisedTable, SupervisedWindower, WindowConfig};
