use anyhow::Context;
use schemars::schema_for;
use schemars::JsonSchema;
use std::fs;
use std::path::{Path, PathBuf};

use demokit_format::{AgentInfo, BrainParameters, DemonstrationHeader, DemonstrationSummary};

fn write_schema<T: JsonSchema>(out_dir: &Path, name: &str) -> anyhow::Result<()> {
    let schema = schema_for!(T);
    let json = serde_json::to_string_pretty(&schema)?;
    let path = out_dir.join(format!("{name}.json"));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn schema_output_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.join("../../schema")
}

fn main() -> anyhow::Result<()> {
    let out_dir = schema_output_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    write_schema::<DemonstrationHeader>(&out_dir, "header")?;
    write_schema::<BrainParameters>(&out_dir, "brain_parameters")?;
    write_schema::<AgentInfo>(&out_dir, "agent_info")?;
    write_schema::<DemonstrationSummary>(&out_dir, "summary")?;

    Ok(())
}
