use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        Ok(Self { dir })
    }

    /// Create and `canopy init` a project in one step.
    pub fn init() -> Result<Self, Box<dyn std::error::Error>> {
        let project = Self::new()?;
        project.cmd().arg("init").assert().success();
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join(".canopy")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".canopy.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// A canopy command rooted in this project.
    pub fn cmd(&self) -> Command {
        let mut cmd = canopy_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Register a tree, returning its id.
    pub fn add_tree(&self, args: &[&str]) -> String {
        let mut cmd = self.cmd();
        cmd.args(["tree", "add", "--json"]);
        cmd.args(args);
        let output = cmd.assert().success().get_output().stdout.clone();
        let value: Value = serde_json::from_slice(&output).expect("tree add json");
        value["data"]["id"].as_str().expect("tree id").to_string()
    }

    /// Assign a task, returning its id.
    pub fn assign_task(&self, tree_id: &str, activity: &str, args: &[&str]) -> String {
        let mut cmd = self.cmd();
        cmd.args(["task", "assign", tree_id, activity, "--json"]);
        cmd.args(args);
        let output = cmd.assert().success().get_output().stdout.clone();
        let value: Value = serde_json::from_slice(&output).expect("task assign json");
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    /// Run `canopy schedule --json` with extra args and return the data payload.
    pub fn schedule_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        cmd.args(["schedule", "--json"]);
        cmd.args(args);
        let output = cmd.assert().success().get_output().stdout.clone();
        let value: Value = serde_json::from_slice(&output).expect("schedule json");
        value["data"].clone()
    }
}

pub fn canopy_cmd() -> Command {
    let mut cmd = Command::cargo_bin("canopy").expect("canopy binary");
    // Keep actor resolution deterministic regardless of the host env.
    cmd.env_remove("CANOPY_ACTOR");
    cmd.env_remove("CANOPY_PROJECT");
    cmd
}

/// Find the schedule row for a (tree, activity) pair in a report payload.
pub fn find_row<'a>(report: &'a Value, tree_id: &str, activity: &str) -> &'a Value {
    report["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .find(|row| row["tree_id"] == tree_id && row["activity"] == activity)
        .unwrap_or_else(|| panic!("no row for {tree_id}/{activity}"))
}
