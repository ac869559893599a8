use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::world::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Variable,
    Condition,
    Action,
    Movement,
    Math,
    Loop,
    Structure,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Condition => "condition",
            Self::Action => "action",
            Self::Movement => "movement",
            Self::Math => "math",
            Self::Loop => "loop",
            Self::Structure => "structure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
        }
    }

    /// Values of different types never compare true.
    pub fn holds(&self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Equals => left == right,
            Self::NotEquals => left.type_name() == right.type_name() && left != right,
            Self::LessThan => match (left.as_number(), right.as_number()) {
                (Some(left), Some(right)) => left < right,
                _ => false,
            },
            Self::GreaterThan => match (left.as_number(), right.as_number()) {
                (Some(left), Some(right)) => left > right,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathChoice {
    Mountain,
    Forest,
    Cave,
}

impl PathChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mountain => "mountain",
            Self::Forest => "forest",
            Self::Cave => "cave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Spell {
    Fire,
    Ice,
    Lightning,
}

impl Spell {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Lightning => "lightning",
        }
    }
}

/// The typed sub-kind of a block together with its effect parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockOp {
    SetNumber {
        name: String,
        value: i64,
    },
    ScanEntity {
        into: String,
    },
    ReadFlag {
        flag: String,
        into: String,
    },
    Compare {
        name: String,
        comparison: Comparison,
        value: Value,
    },
    Collect {
        item: EntityKind,
    },
    BrewPotion,
    TakePath {
        path: PathChoice,
    },
    CastSpell {
        spell: Spell,
    },
    RepairPlank,
    Celebrate,
    StepForward,
    Double {
        name: String,
    },
    Add {
        name: String,
        amount: i64,
    },
    Subtract {
        name: String,
        amount: i64,
    },
    DivideBy {
        name: String,
        divisor: String,
    },
    Repeat {
        times: u32,
    },
    RepeatWhile {
        name: String,
        below: i64,
    },
    EndLoop,
}

impl BlockOp {
    pub fn category(&self) -> Category {
        match self {
            Self::SetNumber { .. } | Self::ScanEntity { .. } | Self::ReadFlag { .. } => {
                Category::Variable
            }
            Self::Compare { .. } => Category::Condition,
            Self::Collect { .. }
            | Self::BrewPotion
            | Self::TakePath { .. }
            | Self::CastSpell { .. }
            | Self::RepairPlank
            | Self::Celebrate => Category::Action,
            Self::StepForward => Category::Movement,
            Self::Double { .. }
            | Self::Add { .. }
            | Self::Subtract { .. }
            | Self::DivideBy { .. } => Category::Math,
            Self::Repeat { .. } | Self::RepeatWhile { .. } => Category::Loop,
            Self::EndLoop => Category::Structure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub id: String,
    pub category: Category,
    pub label: String,
    /// Shown to the learner; never executed.
    pub simulated_code: String,
    pub description: String,
    pub op: BlockOp,
}

impl BlockDefinition {
    /// Builds a definition whose category is taken from `op`.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        simulated_code: impl Into<String>,
        description: impl Into<String>,
        op: BlockOp,
    ) -> Self {
        Self {
            id: id.into(),
            category: op.category(),
            label: label.into(),
            simulated_code: simulated_code.into(),
            description: description.into(),
            op,
        }
    }
}

pub type InstanceId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    pub instance_id: InstanceId,
    pub definition: Arc<BlockDefinition>,
}

impl BlockInstance {
    pub fn block_id(&self) -> &str {
        &self.definition.id
    }

    pub fn op(&self) -> &BlockOp {
        &self.definition.op
    }
}

#[cfg(test)]
mod block_tests {
    use super::*;

    #[test]
    fn new_definition_takes_category_from_op() {
        let definition = BlockDefinition::new(
            "repeat-10",
            "Repeat 10 times",
            "for (let i = 0; i < 10; i++) {",
            "Run the blocks inside ten times.",
            BlockOp::Repeat { times: 10 },
        );
        assert_eq!(definition.category, Category::Loop);
        assert_eq!(BlockOp::EndLoop.category(), Category::Structure);
        assert_eq!(BlockOp::StepForward.category(), Category::Movement);
    }

    #[test]
    fn comparison_never_matches_across_types() {
        assert!(Comparison::Equals.holds(&Value::text("goblin"), &Value::text("goblin")));
        assert!(!Comparison::Equals.holds(&Value::Number(1), &Value::text("1")));
        assert!(!Comparison::NotEquals.holds(&Value::Number(1), &Value::text("1")));
        assert!(Comparison::LessThan.holds(&Value::Number(3), &Value::Number(10)));
        assert!(!Comparison::GreaterThan.holds(&Value::text("b"), &Value::text("a")));
    }

    #[test]
    fn block_op_json_is_tagged_by_kind() {
        let op: BlockOp = serde_json::from_str(r#"{"kind":"castSpell","spell":"lightning"}"#)
            .expect("op should deserialize");
        assert_eq!(
            op,
            BlockOp::CastSpell {
                spell: Spell::Lightning
            }
        );
    }
}
