use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::InstanceId;
use crate::value::VariableEnv;
use crate::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelId {
    Collection,
    Crossroads,
    Combat,
    Bridge,
}

impl LevelId {
    pub const ALL: [LevelId; 4] = [
        Self::Collection,
        Self::Crossroads,
        Self::Combat,
        Self::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Crossroads => "crossroads",
            Self::Combat => "combat",
            Self::Bridge => "bridge",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == raw)
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// A block ran before the block that sets up what it needs.
    MissingPrecondition,
    /// The right kind of block, but the wrong choice for this world.
    WrongChoice,
    /// The program finished without reaching the goal.
    IncompleteGoal,
    /// Rejected before any block ran.
    InvalidProgram,
    InvalidArithmetic,
    RunawayLoop,
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPrecondition => "missingPrecondition",
            Self::WrongChoice => "wrongChoice",
            Self::IncompleteGoal => "incompleteGoal",
            Self::InvalidProgram => "invalidProgram",
            Self::InvalidArithmetic => "invalidArithmetic",
            Self::RunawayLoop => "runawayLoop",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Success { message: String },
    Failure { kind: FailureKind, reason: String },
    StillRunning,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::StillRunning)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } => message,
            Self::Failure { reason, .. } => reason,
            Self::StillRunning => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepSeverity {
    Info,
    /// The block had no effect. The run continues.
    Warning,
    Failure,
}

impl StepSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEvent {
    pub index: usize,
    /// 1-based loop round for blocks executed inside a loop body.
    pub iteration: Option<u32>,
    pub instance_id: InstanceId,
    pub block_id: String,
    pub label: String,
    pub message: String,
    pub severity: StepSeverity,
    pub world: WorldState,
    pub variables: VariableEnv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub level: LevelId,
    pub outcome: Outcome,
    pub events: Vec<StepEvent>,
    pub final_world: WorldState,
    pub final_variables: VariableEnv,
}

impl RunReport {
    /// Message for a result banner: the outcome text, or the last step message.
    pub fn latest_message(&self) -> &str {
        let message = self.outcome.message();
        if !message.is_empty() {
            return message;
        }
        self.events
            .last()
            .map(|event| event.message.as_str())
            .unwrap_or("")
    }

    pub fn events_for_block<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a StepEvent> {
        self.events
            .iter()
            .filter(move |event| event.block_id == block_id)
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn outcome_json_is_tagged_by_status() {
        let json = serde_json::to_string(&Outcome::failure(
            FailureKind::WrongChoice,
            "Trolls shrug off fire.",
        ))
        .expect("outcome should serialize");
        assert_eq!(
            json,
            r#"{"status":"failure","kind":"wrongChoice","reason":"Trolls shrug off fire."}"#
        );
    }

    #[test]
    fn outcome_helpers_report_state() {
        let success = Outcome::success("done");
        assert!(success.is_success());
        assert!(success.is_terminal());
        assert_eq!(success.failure_kind(), None);
        assert!(!Outcome::StillRunning.is_terminal());
        assert_eq!(
            Outcome::failure(FailureKind::Cancelled, "stop").failure_kind(),
            Some(FailureKind::Cancelled)
        );
    }

    #[test]
    fn level_id_parse_accepts_known_names_only() {
        assert_eq!(LevelId::parse("bridge"), Some(LevelId::Bridge));
        assert_eq!(LevelId::parse("Bridge"), None);
        assert_eq!(LevelId::Combat.to_string(), "combat");
    }
}
