//! Reading and writing whole demonstration files.

use crate::{
    AgentInfo, DemonstrationHeader, DemonstrationReader, DemonstrationSummary,
    DemonstrationWriter, FormatResult, SummaryBuilder,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A decoded demonstration.
#[derive(Debug, Clone, PartialEq)]
pub struct DemonstrationFile {
    /// The session metadata (first record)
    pub header: DemonstrationHeader,
    /// Step records in recording order
    pub steps: Vec<AgentInfo>,
    /// The trailer, if the recording was closed
    pub summary: Option<DemonstrationSummary>,
    /// The stream ended partway through a record
    pub truncated: bool,
}

impl DemonstrationFile {
    /// Create an empty demonstration with the given header.
    pub fn new(header: DemonstrationHeader) -> Self {
        Self {
            header,
            steps: Vec::new(),
            summary: None,
            truncated: false,
        }
    }

    /// Read a demonstration file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> FormatResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a demonstration from a reader.
    pub fn from_reader<R: Read>(reader: R) -> FormatResult<Self> {
        DemonstrationReader::open(reader)?.read_to_end()
    }

    /// Write the demonstration to a path.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> FormatResult<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Write the demonstration to a writer.
    ///
    /// The trailer is recomputed from the steps so it always agrees with them.
    pub fn write_to<W: Write>(&self, writer: W) -> FormatResult<()> {
        let mut writer = DemonstrationWriter::new(writer, &self.header)?;
        for step in &self.steps {
            writer.append_step(step)?;
        }
        writer.finish(&self.computed_summary())?;
        Ok(())
    }

    /// Whether the recording was closed cleanly.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some() && !self.truncated
    }

    /// Aggregates recomputed from the step records.
    pub fn computed_summary(&self) -> DemonstrationSummary {
        let mut builder = SummaryBuilder::new();
        for step in &self.steps {
            builder.observe(step);
        }
        builder.current()
    }

    /// Split the steps into episodes. A trailing run of steps without a
    /// terminating `done` forms a final, unfinished episode.
    pub fn episodes(&self) -> Vec<&[AgentInfo]> {
        let mut episodes = Vec::new();
        let mut start = 0;
        for (i, step) in self.steps.iter().enumerate() {
            if step.done {
                episodes.push(&self.steps[start..=i]);
                start = i + 1;
            }
        }
        if start < self.steps.len() {
            episodes.push(&self.steps[start..]);
        }
        episodes
    }

    /// Steps recorded for one agent.
    pub fn steps_for_agent(&self, id: i32) -> Vec<&AgentInfo> {
        self.steps.iter().filter(|s| s.id == id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BrainParameters, SpaceType};

    fn create_test_file() -> DemonstrationFile {
        DemonstrationFile::new(DemonstrationHeader::new(
            "Test",
            "TestBrain",
            BrainParameters {
                vector_observation_size: 1,
                num_stacked_vector_observations: 1,
                vector_action_descriptions: vec!["Move".into()],
                vector_action_size: vec![3],
                vector_action_space_type: SpaceType::Discrete,
            },
        ))
    }

    fn step(id: i32, reward: f32, done: bool) -> AgentInfo {
        AgentInfo {
            id,
            reward,
            done,
            ..AgentInfo::default()
        }
    }

    #[test]
    fn test_create_new_file() {
        let file = create_test_file();
        assert!(file.steps.is_empty());
        assert!(!file.is_complete());
        assert_eq!(file.header.demonstration_name, "Test");
    }

    #[test]
    fn test_write_and_read_back() {
        let mut file = create_test_file();
        file.steps.push(step(1, 0.5, false));
        file.steps.push(step(1, 0.5, true));

        let mut bytes = Vec::new();
        file.write_to(&mut bytes).unwrap();

        let read = DemonstrationFile::from_reader(bytes.as_slice()).unwrap();
        assert!(read.is_complete());
        assert_eq!(read.steps, file.steps);
        assert_eq!(read.header, file.header);
        let summary = read.summary.unwrap();
        assert_eq!(summary.number_steps, 2);
        assert_eq!(summary.number_episodes, 1);
        assert_eq!(summary.cumulative_reward, 1.0);
    }

    #[test]
    fn test_write_to_path_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test.demo");

        let mut file = create_test_file();
        file.steps.push(step(1, 0.25, false));
        file.steps.push(step(2, 0.75, true));
        file.write_to_path(&path).unwrap();

        let read = DemonstrationFile::from_path(&path).unwrap();
        assert!(read.is_complete());
        assert_eq!(read.header, file.header);
        assert_eq!(read.steps, file.steps);
        assert_eq!(read.summary, Some(file.computed_summary()));
    }

    #[test]
    fn test_from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DemonstrationFile::from_path(dir.path().join("missing.demo")).unwrap_err();
        assert!(matches!(err, crate::FormatError::Io(_)));
    }

    #[test]
    fn test_episodes_split_on_done() {
        let mut file = create_test_file();
        file.steps = vec![
            step(1, 0.0, false),
            step(1, 1.0, true),
            step(1, 0.0, true),
            step(1, 0.0, false),
        ];

        let episodes = file.episodes();
        assert_eq!(episodes.len(), 3);
        assert_eq!(episodes[0].len(), 2);
        assert_eq!(episodes[1].len(), 1);
        assert_eq!(episodes[2].len(), 1);
        assert!(!episodes[2][0].done);
    }

    #[test]
    fn test_steps_for_agent() {
        let mut file = create_test_file();
        file.steps = vec![step(1, 0.0, false), step(2, 0.0, false), step(1, 1.0, true)];
        assert_eq!(file.steps_for_agent(1).len(), 2);
        assert_eq!(file.steps_for_agent(3).len(), 0);
    }
}
