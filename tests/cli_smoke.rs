mod support;

use predicates::str::contains;

use support::{canopy_cmd, TestProject};

#[test]
fn version_and_help_work() {
    canopy_cmd().arg("--version").assert().success();
    canopy_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("schedule"));
}

#[test]
fn commands_require_an_initialized_project() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;

    project
        .cmd()
        .args(["tree", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("canopy init"));

    Ok(())
}

#[test]
fn init_creates_state_and_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;

    project.cmd().arg("init").assert().success();
    assert!(project.state_dir().exists());
    assert!(project.state_dir().join("trees.json").exists());
    assert!(project.state_dir().join("tasks.jsonl").exists());
    assert!(project.state_dir().join("maturity.json").exists());

    // Second init succeeds without clobbering anything.
    project.cmd().arg("init").assert().success();

    Ok(())
}

#[test]
fn json_errors_carry_schema_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;

    let output = project
        .cmd()
        .args(["tree", "list", "--json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["schema_version"], "canopy.v1");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], 2);

    Ok(())
}
