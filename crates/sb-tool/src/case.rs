use std::collections::BTreeMap;

use sb_core::{FailureKind, Outcome, Value};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "sb-tool-case.v1";

/// One program run against one level, with the result it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    pub level: String,
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub monsters: Option<Vec<String>>,
    #[serde(default)]
    pub blocks: Vec<String>,
    pub expected: ExpectedOutcome,
    #[serde(default)]
    pub expected_steps: Option<usize>,
    #[serde(default)]
    pub expected_final_position: Option<usize>,
    /// Substrings that must appear in step messages, in this order.
    #[serde(default)]
    pub expected_messages: Vec<String>,
    #[serde(default)]
    pub expected_variables: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExpectedOutcome {
    Success,
    Failure { kind: FailureKind },
}

impl ExpectedOutcome {
    pub fn matches(&self, outcome: &Outcome) -> bool {
        match self {
            Self::Success => outcome.is_success(),
            Self::Failure { kind } => outcome.failure_kind() == Some(*kind),
        }
    }
}
