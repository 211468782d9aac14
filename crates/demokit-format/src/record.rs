//! Record payload types for the demonstration format.
//!
//! A demonstration stream holds three kinds of records: one header, one step
//! record per recorded decision, and one summary trailer. The field order of
//! each struct is the field order on the wire.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{EncodingError, FORMAT_VERSION};

/// The three structural record kinds of a demonstration stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Session metadata (must be first)
    Header,
    /// One agent step
    Step,
    /// Aggregate statistics (must be last)
    Summary,
}

impl RecordKind {
    /// Tag byte written in front of each record.
    pub fn as_byte(self) -> u8 {
        match self {
            RecordKind::Header => 0x01,
            RecordKind::Step => 0x02,
            RecordKind::Summary => 0x03,
        }
    }

    /// Parse a tag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(RecordKind::Header),
            0x02 => Some(RecordKind::Step),
            0x03 => Some(RecordKind::Summary),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Header => "header",
            RecordKind::Step => "step",
            RecordKind::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// Whether actions are chosen from discrete branches or are continuous values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    Discrete,
    Continuous,
}

/// Description of the brain whose decisions are being recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BrainParameters {
    /// Length of a single vector observation
    pub vector_observation_size: u32,
    /// How many vector observations are stacked per step (at least 1)
    pub num_stacked_vector_observations: u32,
    /// Human-readable label per action branch
    pub vector_action_descriptions: Vec<String>,
    /// Size of each action branch
    pub vector_action_size: Vec<u32>,
    /// Discrete or continuous action space
    pub vector_action_space_type: SpaceType,
}

impl BrainParameters {
    /// Number of declared action branches.
    pub fn num_action_branches(&self) -> usize {
        self.vector_action_size.len()
    }

    /// Expected length of a stacked vector observation.
    pub fn stacked_observation_size(&self) -> usize {
        self.vector_observation_size as usize * self.num_stacked_vector_observations as usize
    }

    /// Check the structural invariants required to encode these parameters.
    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.num_stacked_vector_observations == 0 {
            return Err(EncodingError::NoStackedObservations);
        }
        if self.vector_action_descriptions.len() != self.vector_action_size.len() {
            return Err(EncodingError::ActionBranchMismatch {
                descriptions: self.vector_action_descriptions.len(),
                sizes: self.vector_action_size.len(),
            });
        }
        Ok(())
    }
}

/// The agent state captured at one decision step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct AgentInfo {
    /// Reward received for the previous action
    pub reward: f32,
    /// One entry per discrete action; `true` means the action is masked out
    pub action_masks: Vec<bool>,
    /// The episode terminated at this step
    pub done: bool,
    /// Agent identifier
    pub id: i32,
    /// The episode ended because it hit the step limit
    pub max_step_reached: bool,
    /// Stacked vector observation values
    pub stacked_vector_observation: Vec<f32>,
    /// Text action taken
    pub stored_text_actions: String,
    /// Vector action taken
    pub stored_vector_actions: Vec<f32>,
    /// Free-text observation
    pub text_observation: String,
}

/// Header record payload. Written exactly once, before any step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DemonstrationHeader {
    /// Format version; always the first field so readers can check it early
    pub format_version: u32,
    /// Sanitized demonstration name (the file stem)
    pub demonstration_name: String,
    /// Name of the brain being demonstrated
    pub brain_name: String,
    /// Brain description
    pub brain_parameters: BrainParameters,
    /// Unique recording session identifier
    pub session_id: Uuid,
    /// Wall-clock time when recording started
    pub recorded_at: DateTime<Utc>,
}

impl DemonstrationHeader {
    /// Create a header for a new recording session.
    pub fn new(
        demonstration_name: impl Into<String>,
        brain_name: impl Into<String>,
        brain_parameters: BrainParameters,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            demonstration_name: demonstration_name.into(),
            brain_name: brain_name.into(),
            brain_parameters,
            session_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
        }
    }
}

/// Summary trailer payload. Written exactly once, after the last step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct DemonstrationSummary {
    /// Total step records written
    pub number_steps: u64,
    /// Steps that ended an episode
    pub number_episodes: u64,
    /// Sum of all recorded rewards
    pub cumulative_reward: f64,
}

impl DemonstrationSummary {
    /// Average reward per completed episode, or 0 when none completed.
    pub fn mean_reward(&self) -> f64 {
        if self.number_episodes == 0 {
            0.0
        } else {
            self.cumulative_reward / self.number_episodes as f64
        }
    }
}

/// Running aggregates that become the summary trailer.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    summary: DemonstrationSummary,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one recorded step into the aggregates.
    pub fn observe(&mut self, info: &AgentInfo) {
        self.summary.number_steps += 1;
        self.summary.cumulative_reward += f64::from(info.reward);
        if info.done {
            self.summary.number_episodes += 1;
        }
    }

    /// Aggregates so far.
    pub fn current(&self) -> DemonstrationSummary {
        self.summary
    }
}
