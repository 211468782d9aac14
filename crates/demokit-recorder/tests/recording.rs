use demokit_format::{
    validate_default, AgentInfo, BrainParameters, DemonstrationFile, SpaceType, FORMAT_VERSION,
};
use demokit_recorder::{
    DemoStorage, DemonstrationStore, MemoryStorage, OsStorage, RecorderConfig, RecorderError,
    StoreStateKind,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn scenario_params() -> BrainParameters {
    BrainParameters {
        vector_observation_size: 3,
        num_stacked_vector_observations: 2,
        vector_action_descriptions: vec!["TestActionA".to_string(), "TestActionB".to_string()],
        vector_action_size: vec![2, 2],
        vector_action_space_type: SpaceType::Discrete,
    }
}

fn scenario_info() -> AgentInfo {
    AgentInfo {
        reward: 1.0,
        action_masks: vec![false, true],
        done: true,
        id: 5,
        max_step_reached: true,
        stacked_vector_observation: vec![1.0, 1.0, 1.0],
        stored_text_actions: "TestAction".to_string(),
        stored_vector_actions: vec![0.0, 1.0],
        text_observation: "TestAction".to_string(),
    }
}

#[test]
fn single_step_scenario_in_memory() {
    let storage = MemoryStorage::new();
    let mut store = DemonstrationStore::new(storage.clone(), RecorderConfig::with_root("project"));

    let path = store
        .initialize("Test", scenario_params(), "TestBrain")
        .expect("initialize");
    assert!(storage.directory_exists(Path::new("project/Demonstrations")));
    assert!(storage.file_exists(Path::new("project/Demonstrations/Test.demo")));

    store.record(&scenario_info()).expect("record");
    let summary = store.close().expect("close");

    assert!(storage.file_exists(&path));
    assert_eq!(summary.number_steps, 1);
    assert_eq!(summary.number_episodes, 1);
    assert_eq!(summary.cumulative_reward, 1.0);

    let bytes = storage.contents(&path).expect("file contents");
    let file = DemonstrationFile::from_reader(bytes.as_slice()).expect("decode");
    assert_eq!(file.header.format_version, FORMAT_VERSION);
    assert_eq!(file.steps, vec![scenario_info()]);
    assert_eq!(file.summary, Some(summary));
    assert!(validate_default(&file).is_valid());
}

#[test]
fn single_step_scenario_on_disk() {
    let root = tempfile::tempdir().expect("temp dir");
    let mut store = DemonstrationStore::new(OsStorage, RecorderConfig::with_root(root.path()));

    let path = store
        .initialize("Test", scenario_params(), "TestBrain")
        .expect("initialize");
    assert!(root.path().join("Demonstrations").is_dir());
    assert_eq!(path, root.path().join("Demonstrations").join("Test.demo"));
    assert!(path.is_file());

    store.record(&scenario_info()).expect("record");
    store.close().expect("close");

    let file = DemonstrationFile::from_path(&path).expect("decode");
    assert!(file.is_complete());
    let summary = file.summary.expect("summary");
    assert_eq!(summary.number_steps, 1);
    assert_eq!(summary.number_episodes, 1);
    assert_eq!(summary.cumulative_reward, 1.0);
}

#[test]
fn trailer_matches_recorded_steps() {
    let storage = MemoryStorage::new();
    let mut store = DemonstrationStore::new(storage.clone(), RecorderConfig::default());
    let path = store
        .initialize("Many Steps", scenario_params(), "TestBrain")
        .expect("initialize");

    let mut expected_reward = 0.0f64;
    let mut expected_episodes = 0;
    for i in 0..50 {
        let info = AgentInfo {
            reward: (i % 7) as f32 * 0.5 - 1.0,
            done: i % 10 == 9,
            id: i,
            ..scenario_info()
        };
        expected_reward += f64::from(info.reward);
        if info.done {
            expected_episodes += 1;
        }
        store.record(&info).expect("record");
    }
    let summary = store.close().expect("close");

    assert_eq!(summary.number_steps, 50);
    assert_eq!(summary.number_episodes, expected_episodes);
    assert_eq!(summary.cumulative_reward, expected_reward);

    let file = DemonstrationFile::from_reader(storage.contents(&path).unwrap().as_slice())
        .expect("decode");
    let ids: Vec<i32> = file.steps.iter().map(|s| s.id).collect();
    assert_eq!(ids, (0..50).collect::<Vec<_>>());
    assert_eq!(file.episodes().len(), 5);
}

#[test]
fn empty_name_never_creates_a_file() {
    let storage = MemoryStorage::new();
    let mut store = DemonstrationStore::new(storage.clone(), RecorderConfig::default());

    let err = store
        .initialize("", scenario_params(), "TestBrain")
        .expect_err("empty name must be rejected");
    assert!(matches!(err, RecorderError::InvalidName { .. }));
    assert!(storage.files().is_empty());
    assert_eq!(store.state(), StoreStateKind::Uninitialized);
}

#[test]
fn independent_stores_do_not_interfere() {
    let storage = MemoryStorage::new();
    let mut first = DemonstrationStore::new(storage.clone(), RecorderConfig::default());
    let mut second = DemonstrationStore::new(storage.clone(), RecorderConfig::default());

    let first_path = first
        .initialize("First", scenario_params(), "BrainA")
        .unwrap();
    let second_path = second
        .initialize("Second", scenario_params(), "BrainB")
        .unwrap();

    first.record(&scenario_info()).unwrap();
    second.record(&scenario_info()).unwrap();
    second.record(&scenario_info()).unwrap();
    first.close().unwrap();
    second.close().unwrap();

    let a = DemonstrationFile::from_reader(storage.contents(&first_path).unwrap().as_slice())
        .unwrap();
    let b = DemonstrationFile::from_reader(storage.contents(&second_path).unwrap().as_slice())
        .unwrap();
    assert_eq!(a.steps.len(), 1);
    assert_eq!(a.header.brain_name, "BrainA");
    assert_eq!(b.steps.len(), 2);
    assert_eq!(b.header.brain_name, "BrainB");
    assert_eq!(storage.open_handles(), 0);
}

#[test]
fn unclosed_recording_is_recoverable() {
    let storage = MemoryStorage::new();
    let mut store = DemonstrationStore::new(storage.clone(), RecorderConfig::default());
    let path = store
        .initialize("Crashed", scenario_params(), "TestBrain")
        .unwrap();
    store.record(&scenario_info()).unwrap();
    store.record(&scenario_info()).unwrap();
    drop(store);

    let mut bytes = storage.contents(&path).unwrap();
    // Simulate a torn final write.
    bytes.truncate(bytes.len() - 3);

    let file = DemonstrationFile::from_reader(bytes.as_slice()).unwrap();
    assert_eq!(file.steps.len(), 1);
    assert!(file.summary.is_none());
    assert!(file.truncated);
    assert!(!file.is_complete());
}

#[test]
fn unclosed_recording_on_disk_keeps_every_step() {
    let root = tempfile::tempdir().expect("temp dir");
    let mut store = DemonstrationStore::new(OsStorage, RecorderConfig::with_root(root.path()));
    let path = store
        .initialize("Crashed", scenario_params(), "TestBrain")
        .expect("initialize");
    store.record(&scenario_info()).expect("record");
    store.record(&scenario_info()).expect("record");
    // Dropping flushes the buffered handle but writes no trailer.
    drop(store);

    let file = DemonstrationFile::from_path(&path).expect("decode");
    assert_eq!(file.steps, vec![scenario_info(), scenario_info()]);
    assert!(file.summary.is_none());
    assert!(!file.truncated);
    assert!(!file.is_complete());
}
