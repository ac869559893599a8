use std::time::Duration;

use sb_core::{
    BlockDefinition, BlockOp, Entity, EntityKind, LevelId, Value, VariableEnv, WorldState,
};

use super::{celebrate_block, step_forward_block};
use crate::level::{GoalStatus, LevelPolicy, StepResult};

const TRACK_LENGTH: usize = 11;
const PLANKS: usize = 10;

/// Bridge Repair: cross all ten planks and count every step on the way.
#[derive(Debug, Clone, Default)]
pub struct BridgePolicy;

impl BridgePolicy {
    pub fn new() -> Self {
        Self
    }
}

fn repair(world: &mut WorldState) -> StepResult {
    let Some(id) = world
        .unresolved_here(|entity| entity.kind == EntityKind::BrokenPlank)
        .map(|entity| entity.id.clone())
    else {
        return StepResult::NoOp(format!(
            "There is no broken plank on square {}.",
            world.position
        ));
    };
    world.resolve(&id);
    let repaired = world
        .flag("planksRepaired")
        .and_then(Value::as_number)
        .unwrap_or(0)
        + 1;
    world.set_flag("planksRepaired", Value::Number(repaired));
    StepResult::Done(format!(
        "The wizard repairs the plank on square {}. Planks repaired: {}",
        world.position, repaired
    ))
}

impl LevelPolicy for BridgePolicy {
    fn id(&self) -> LevelId {
        LevelId::Bridge
    }

    fn title(&self) -> &'static str {
        "Bridge Repair"
    }

    fn default_step_delay(&self) -> Duration {
        Duration::from_millis(800)
    }

    fn catalog_definitions(&self) -> Vec<BlockDefinition> {
        vec![
            BlockDefinition::new(
                "create-steps",
                "Create steps = 0",
                "let steps = 0;",
                "A variable that counts how many steps the wizard takes.",
                BlockOp::SetNumber {
                    name: "steps".to_string(),
                    value: 0,
                },
            ),
            BlockDefinition::new(
                "repeat-10",
                "Repeat 10 times",
                "for (let i = 0; i < 10; i++) {",
                "Run the blocks below, up to \"End loop\", ten times.",
                BlockOp::Repeat { times: 10 },
            ),
            BlockDefinition::new(
                "repeat-5",
                "Repeat 5 times",
                "for (let i = 0; i < 5; i++) {",
                "Run the blocks below, up to \"End loop\", five times.",
                BlockOp::Repeat { times: 5 },
            ),
            BlockDefinition::new(
                "repeat-while-steps-below-10",
                "Repeat while steps < 10",
                "while (steps < 10) {",
                "Keep running the blocks below while steps is less than 10.",
                BlockOp::RepeatWhile {
                    name: "steps".to_string(),
                    below: PLANKS as i64,
                },
            ),
            step_forward_block(),
            BlockDefinition::new(
                "repair-plank",
                "Repair plank",
                "bridge.repair(wizard.position);",
                "Fix the broken plank under the wizard.",
                BlockOp::RepairPlank,
            ),
            BlockDefinition::new(
                "count-step",
                "Add 1 to steps",
                "steps = steps + 1;",
                "Count one more step.",
                BlockOp::Add {
                    name: "steps".to_string(),
                    amount: 1,
                },
            ),
            BlockDefinition::new(
                "end-loop",
                "End loop",
                "}",
                "Marks where the loop body ends.",
                BlockOp::EndLoop,
            ),
            celebrate_block(),
        ]
    }

    fn initial_world(&self) -> WorldState {
        (1..=PLANKS).fold(
            WorldState::new(TRACK_LENGTH).with_flag("planksRepaired", Value::Number(0)),
            |world, position| {
                world.with_entity(Entity::new(
                    format!("plank-{}", position),
                    EntityKind::BrokenPlank,
                    position,
                ))
            },
        )
    }

    fn allows_loops(&self) -> bool {
        true
    }

    fn supports_action(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::RepairPlank)
    }

    fn is_scannable(&self, entity: &Entity) -> bool {
        entity.kind == EntityKind::BrokenPlank
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, _vars: &mut VariableEnv) -> StepResult {
        match op {
            BlockOp::RepairPlank => repair(world),
            _ => StepResult::NoOp("Nothing happens on the bridge.".to_string()),
        }
    }

    fn evaluate_goal(&self, world: &WorldState, vars: &VariableEnv) -> GoalStatus {
        let far_side = world.track_end();
        if world.position < far_side {
            return GoalStatus::Unmet(format!(
                "The wizard stopped on square {}. The far side of the bridge is square {}.",
                world.position, far_side
            ));
        }
        match vars.number("steps") {
            Some(steps) if steps == PLANKS as i64 => GoalStatus::Met(format!(
                "The wizard crossed all {} planks and counted every step!",
                PLANKS
            )),
            Some(steps) => GoalStatus::Unmet(format!(
                "steps is {}, but the wizard crossed {} planks.",
                steps, PLANKS
            )),
            None => GoalStatus::Unmet(
                "The wizard crossed the bridge, but nobody counted the steps. Create steps and add 1 for each step."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod bridge_tests {
    use super::*;

    #[test]
    fn planks_fill_every_square_but_the_banks() {
        let world = BridgePolicy::new().initial_world();
        assert_eq!(world.track_end(), 10);
        assert_eq!(world.entities.len(), PLANKS);
        assert!(world.entities.iter().all(|entity| (1..=10).contains(&entity.position)));
    }

    #[test]
    fn repair_counts_each_plank_once() {
        let policy = BridgePolicy::new();
        let mut world = policy.initial_world();
        let mut vars = VariableEnv::new();
        assert!(matches!(
            policy.perform(&BlockOp::RepairPlank, &mut world, &mut vars),
            StepResult::NoOp(_)
        ));

        world.position = 4;
        assert!(matches!(
            policy.perform(&BlockOp::RepairPlank, &mut world, &mut vars),
            StepResult::Done(_)
        ));
        assert!(matches!(
            policy.perform(&BlockOp::RepairPlank, &mut world, &mut vars),
            StepResult::NoOp(_)
        ));
        assert_eq!(world.flag("planksRepaired"), Some(&Value::Number(1)));
    }

    #[test]
    fn goal_needs_far_side_and_counted_steps() {
        let policy = BridgePolicy::new();
        let mut world = policy.initial_world();
        let mut vars = VariableEnv::new();
        world.position = 10;
        assert!(matches!(
            policy.evaluate_goal(&world, &vars),
            GoalStatus::Unmet(reason) if reason.contains("counted")
        ));

        vars.set("steps", Value::Number(9));
        assert!(matches!(policy.evaluate_goal(&world, &vars), GoalStatus::Unmet(_)));

        vars.set("steps", Value::Number(10));
        assert!(matches!(policy.evaluate_goal(&world, &vars), GoalStatus::Met(_)));

        world.position = 9;
        assert!(matches!(policy.evaluate_goal(&world, &vars), GoalStatus::Unmet(_)));
    }
}
