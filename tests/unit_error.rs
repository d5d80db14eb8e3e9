use std::path::PathBuf;

use canopy::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let blocked = Error::NoteRequired("mt-abc".to_string());
    assert_eq!(blocked.exit_code(), exit_codes::REVIEW_BLOCKED);

    let transition = Error::InvalidTransition {
        task_id: "mt-abc".to_string(),
        action: "approve".to_string(),
        state: "open/none".to_string(),
    };
    assert_eq!(transition.exit_code(), exit_codes::REVIEW_BLOCKED);

    let op = Error::OperationFailed("boom".to_string());
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);

    let not_a_project = Error::NotAProject(PathBuf::from("/tmp/nowhere"));
    assert_eq!(not_a_project.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn json_error_includes_code() {
    let err = Error::TreeNotFound("abc123".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("Tree not found"));
}

#[test]
fn transition_errors_carry_details() {
    let err = Error::InvalidTransition {
        task_id: "mt-abc".to_string(),
        action: "reopen".to_string(),
        state: "open/rejected".to_string(),
    };
    let details = err.details().expect("details");
    assert_eq!(details["task_id"], "mt-abc");
    assert_eq!(details["action"], "reopen");
}
