mod case;
mod runner;
mod source;

pub use case::{CaseStep, ExpectedPage, ExpectedState, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, ObservedState, RunReport};
pub use source::{collect_case_files, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .case.json files under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("Engine error: {0}")]
    Engine(#[from] be_core::BattleEventError),
    #[error("Guard exceeded: max_frames={max_frames}.")]
    GuardExceeded { max_frames: u64 },
    #[error("State mismatch at {field}. expected={expected} actual={actual}")]
    StateMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize state for diff: {0}")]
    StateSerialize(serde_json::Error),
}
