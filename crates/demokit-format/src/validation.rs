//! Validation utilities for decoded demonstrations.

use crate::{DemonstrationFile, SpaceType, ValidationError};

/// Validation options.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Check the summary trailer against the step records
    pub check_summary: bool,
    /// Warn when a stacked observation has an unexpected length
    pub warn_observation_size: bool,
    /// Warn when discrete action masks do not cover every action
    pub warn_action_masks: bool,
    /// Tolerance when comparing cumulative rewards
    pub reward_tolerance: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_summary: true,
            warn_observation_size: true,
            warn_action_masks: true,
            reward_tolerance: 1e-6,
        }
    }
}

/// Validation result.
#[derive(Debug)]
pub struct ValidationResult {
    /// Hard errors that make the file invalid
    pub errors: Vec<ValidationError>,
    /// Warnings that don't make the file invalid
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a decoded demonstration.
pub fn validate(file: &DemonstrationFile, options: &ValidationOptions) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let params = &file.header.brain_parameters;

    if let Err(e) = params.validate() {
        errors.push(ValidationError::BrainParameters(e));
    }

    if file.truncated {
        warnings.push("File ends partway through a record".to_string());
    }

    let expected_obs = params.stacked_observation_size();
    let expected_masks: usize = params.vector_action_size.iter().map(|&s| s as usize).sum();

    for (index, step) in file.steps.iter().enumerate() {
        if options.warn_observation_size && step.stacked_vector_observation.len() != expected_obs {
            warnings.push(format!(
                "Step {} has {} observation values, expected {}",
                index,
                step.stacked_vector_observation.len(),
                expected_obs
            ));
        }
        if options.warn_action_masks
            && params.vector_action_space_type == SpaceType::Discrete
            && !step.action_masks.is_empty()
            && step.action_masks.len() != expected_masks
        {
            warnings.push(format!(
                "Step {} has {} action masks, expected {}",
                index,
                step.action_masks.len(),
                expected_masks
            ));
        }
    }

    match (&file.summary, options.check_summary) {
        (Some(summary), true) => {
            let actual = file.computed_summary();
            if summary.number_steps != actual.number_steps {
                errors.push(ValidationError::StepCountMismatch {
                    summary: summary.number_steps,
                    actual: actual.number_steps,
                });
            }
            if summary.number_episodes != actual.number_episodes {
                errors.push(ValidationError::EpisodeCountMismatch {
                    summary: summary.number_episodes,
                    actual: actual.number_episodes,
                });
            }
            if (summary.cumulative_reward - actual.cumulative_reward).abs()
                > options.reward_tolerance
            {
                errors.push(ValidationError::RewardMismatch {
                    summary: summary.cumulative_reward,
                    actual: actual.cumulative_reward,
                });
            }
        }
        (None, _) => warnings.push("File has no summary trailer".to_string()),
        (Some(_), false) => {}
    }

    ValidationResult { errors, warnings }
}

/// Validate a demonstration with default options.
pub fn validate_default(file: &DemonstrationFile) -> ValidationResult {
    validate(file, &ValidationOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn make_file() -> DemonstrationFile {
        DemonstrationFile::new(DemonstrationHeader::new(
            "Test",
            "TestBrain",
            BrainParameters {
                vector_observation_size: 3,
                num_stacked_vector_observations: 1,
                vector_action_descriptions: vec!["A".into(), "B".into()],
                vector_action_size: vec![2, 2],
                vector_action_space_type: SpaceType::Discrete,
            },
        ))
    }

    fn make_step(reward: f32, done: bool) -> AgentInfo {
        AgentInfo {
            reward,
            done,
            stacked_vector_observation: vec![0.0; 3],
            action_masks: vec![false; 4],
            ..AgentInfo::default()
        }
    }

    #[test]
    fn test_valid_file() {
        let mut file = make_file();
        file.steps = vec![make_step(1.0, false), make_step(2.0, true)];
        file.summary = Some(file.computed_summary());

        let result = validate_default(&file);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_summary_mismatch() {
        let mut file = make_file();
        file.steps = vec![make_step(1.0, true)];
        file.summary = Some(DemonstrationSummary {
            number_steps: 2,
            number_episodes: 0,
            cumulative_reward: 5.0,
        });

        let result = validate_default(&file);
        assert!(!result.is_valid());
        assert_eq!(result.errors.len(), 3);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::StepCountMismatch { summary: 2, actual: 1 })));
    }

    #[test]
    fn test_missing_summary_is_warning() {
        let mut file = make_file();
        file.steps = vec![make_step(1.0, false)];
        file.truncated = true;

        let result = validate_default(&file);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_shape_warnings() {
        let mut file = make_file();
        let mut step = make_step(0.0, false);
        step.stacked_vector_observation = vec![1.0];
        step.action_masks = vec![true];
        file.steps = vec![step];
        file.summary = Some(file.computed_summary());

        let result = validate_default(&file);
        assert!(result.is_valid()); // Shape problems are warnings, not errors
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_invalid_brain_parameters() {
        let mut file = make_file();
        file.header.brain_parameters.vector_action_descriptions.clear();
        file.summary = Some(file.computed_summary());

        let result = validate_default(&file);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::BrainParameters(_))));
    }
}
