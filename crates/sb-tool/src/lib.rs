mod case;
mod runner;
mod source;

pub use case::{ExpectedOutcome, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, check_report, run_case};
pub use source::{read_cases_from_dir, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SbToolError {
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
    #[error("Failed to scan {path}: {source}")]
    ScanDir {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("No .json testcases under {path}.")]
    CasesEmpty { path: PathBuf },
    #[error("Engine error: {0}")]
    Engine(#[from] sb_core::SpellBlocksError),
    #[error("Expected outcome {expected}, actual {actual}.")]
    OutcomeMismatch { expected: String, actual: String },
    #[error("Expected {expected} steps, actual {actual}.")]
    StepCountMismatch { expected: usize, actual: usize },
    #[error("Expected final position {expected}, actual {actual}.")]
    FinalPositionMismatch { expected: usize, actual: usize },
    #[error("Expected variable {name} = {expected}, actual {actual}.")]
    VariableMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("Message not found in order: \"{message}\". observed={observed}")]
    MessageMissing { message: String, observed: String },
    #[error("Failed to serialize outcome for diff: {0}")]
    OutcomeSerialize(serde_json::Error),
}
