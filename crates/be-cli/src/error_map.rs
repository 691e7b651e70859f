use be_core::BattleEventError;
use be_tool::BeToolError;

pub(crate) fn emit_error(error: BattleEventError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", message_json(&error.message));
    1
}

pub(crate) fn message_json(message: &str) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{:?}", message))
}

pub(crate) fn map_tool_error(error: BeToolError) -> BattleEventError {
    let code = match &error {
        BeToolError::Engine(inner) => return inner.clone(),
        BeToolError::ReadFile { .. } => "CLI_CASE_READ",
        BeToolError::ParseCase { .. } => "CLI_CASE_INVALID",
        BeToolError::InvalidSchemaVersion { .. } => "CLI_CASE_SCHEMA",
        BeToolError::SourceEmpty { .. } => "CLI_SOURCE_EMPTY",
        BeToolError::GuardExceeded { .. } => "CLI_CASE_GUARD",
        BeToolError::StateMismatch { .. } | BeToolError::StateSerialize(_) => "CLI_CASE_MISMATCH",
    };
    BattleEventError::new(code, error.to_string())
}
