//! # demokit-recorder
//!
//! Records agent trajectories into demonstration files.
//!
//! A [`DemonstrationStore`] owns one output file for its whole lifetime. It
//! sanitizes the requested name, makes sure the output directory exists,
//! writes the header, appends one record per step, and writes the summary
//! trailer on [`DemonstrationStore::close`]. All filesystem access goes
//! through the injected [`DemoStorage`], so tests can use [`MemoryStorage`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use demokit_format::{AgentInfo, BrainParameters, SpaceType};
//! use demokit_recorder::{DemonstrationStore, OsStorage, RecorderConfig};
//!
//! let params = BrainParameters {
//!     vector_observation_size: 3,
//!     num_stacked_vector_observations: 1,
//!     vector_action_descriptions: vec!["Move".into()],
//!     vector_action_size: vec![4],
//!     vector_action_space_type: SpaceType::Discrete,
//! };
//!
//! let mut store = DemonstrationStore::new(OsStorage, RecorderConfig::with_root("."));
//! store.initialize("Expert Run", params, "PlayerBrain")?;
//! store.record(&AgentInfo { reward: 1.0, done: true, ..AgentInfo::default() })?;
//! let summary = store.close()?;
//! println!("recorded {} steps", summary.number_steps);
//! # Ok::<(), demokit_recorder::RecorderError>(())
//! ```

mod config;
mod error;
mod storage;
mod store;

pub use config::*;
pub use error::*;
pub use storage::*;
pub use store::*;
