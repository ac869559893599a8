//! The four level policies and their block catalogs.

mod bridge;
mod collection;
mod combat;
mod crossroads;

pub use bridge::BridgePolicy;
pub use collection::CollectionPolicy;
pub use combat::CombatPolicy;
pub use crossroads::CrossroadsPolicy;

use sb_core::{BlockDefinition, BlockOp, LevelId};

use crate::level::{LevelOptions, LevelPolicy};

pub fn policy_for(options: &LevelOptions) -> Box<dyn LevelPolicy> {
    match options.level {
        LevelId::Collection => Box::new(CollectionPolicy::new()),
        LevelId::Crossroads => Box::new(CrossroadsPolicy::new(options.seed(), options.weather)),
        LevelId::Combat => Box::new(CombatPolicy::new(options.seed(), options.monsters.as_deref())),
        LevelId::Bridge => Box::new(BridgePolicy::new()),
    }
}

fn step_forward_block() -> BlockDefinition {
    BlockDefinition::new(
        "step-forward",
        "Step forward",
        "wizard.stepForward();",
        "Move the wizard one square along the path.",
        BlockOp::StepForward,
    )
}

fn celebrate_block() -> BlockDefinition {
    BlockDefinition::new(
        "celebrate",
        "Celebrate",
        "wizard.celebrate();",
        "A little victory dance. It does not change the result.",
        BlockOp::Celebrate,
    )
}
