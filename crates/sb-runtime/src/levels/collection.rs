use std::time::Duration;

use sb_core::{
    BlockDefinition, BlockOp, Entity, EntityKind, FailureKind, LevelId, Value, VariableEnv,
    WorldState,
};

use super::{celebrate_block, step_forward_block};
use crate::level::{GoalStatus, LevelPolicy, StepResult};

const TRACK_LENGTH: usize = 10;
const CAULDRON_POSITION: usize = 9;
const TARGET_TOTAL: i64 = 7;

/// Ingredient, square and magic power.
const INGREDIENTS: [(EntityKind, usize, i64); 4] = [
    (EntityKind::Mushroom, 1, 5),
    (EntityKind::Crystal, 3, 8),
    (EntityKind::Herbs, 5, 6),
    (EntityKind::Water, 7, 9),
];

/// Potion Workshop: collect all four ingredients and bring `total` to exactly 7.
#[derive(Debug, Clone, Default)]
pub struct CollectionPolicy;

impl CollectionPolicy {
    pub fn new() -> Self {
        Self
    }
}

fn power_of(kind: EntityKind) -> Option<i64> {
    INGREDIENTS
        .iter()
        .find(|(ingredient, _, _)| *ingredient == kind)
        .map(|(_, _, power)| *power)
}

fn is_ingredient(entity: &Entity) -> bool {
    power_of(entity.kind).is_some()
}

fn collect(item: EntityKind, world: &mut WorldState, vars: &mut VariableEnv) -> StepResult {
    let (Some(total), Some(count)) = (vars.number("total"), vars.number("count")) else {
        return StepResult::Fail(
            FailureKind::MissingPrecondition,
            format!(
                "To collect the {} the wizard needs the variables total and count. Create them first.",
                item
            ),
        );
    };

    let Some(id) = world
        .unresolved_here(|entity| entity.kind == item)
        .map(|entity| entity.id.clone())
    else {
        let already = world
            .entities
            .iter()
            .any(|entity| entity.kind == item && entity.resolved);
        return StepResult::NoOp(if already {
            format!("The {} is already in the bag.", item)
        } else {
            format!("There is no {} on square {}.", item, world.position)
        });
    };

    let power = power_of(item).unwrap_or_default();
    let Some(next_total) = total.checked_add(power) else {
        return StepResult::Fail(
            FailureKind::InvalidArithmetic,
            "total is too big for the wizard to count.".to_string(),
        );
    };
    let next_count = count.saturating_add(1);
    world.resolve(&id);
    vars.set("total", Value::Number(next_total));
    vars.set("count", Value::Number(next_count));
    StepResult::Done(format!(
        "The wizard collects the {} (power {}). total = {}, count = {}",
        item, power, next_total, next_count
    ))
}

fn brew(world: &mut WorldState, vars: &VariableEnv) -> StepResult {
    if world.position != CAULDRON_POSITION {
        return StepResult::NoOp(format!(
            "The cauldron is on square {}. The wizard is on square {}.",
            CAULDRON_POSITION, world.position
        ));
    }
    let Some(total) = vars.number("total") else {
        return StepResult::Fail(
            FailureKind::MissingPrecondition,
            "The cauldron needs a total to brew with. Create total first.".to_string(),
        );
    };
    world.set_flag("potionBrewed", Value::Bool(true));
    world.set_flag("potionStrength", Value::Number(total));
    StepResult::Done(format!(
        "The cauldron bubbles! The potion has strength {}.",
        total
    ))
}

impl LevelPolicy for CollectionPolicy {
    fn id(&self) -> LevelId {
        LevelId::Collection
    }

    fn title(&self) -> &'static str {
        "Potion Workshop"
    }

    fn default_step_delay(&self) -> Duration {
        Duration::from_millis(1000)
    }

    fn catalog_definitions(&self) -> Vec<BlockDefinition> {
        let collect_block = |id: &str, item: EntityKind| {
            BlockDefinition::new(
                id,
                format!("Collect {}", item),
                format!("total = total + {}.power;\ncount = count + 1;", item),
                format!("Pick up the {} on this square and add its power to total.", item),
                BlockOp::Collect { item },
            )
        };

        vec![
            BlockDefinition::new(
                "create-total",
                "Create total = 0",
                "let total = 0;",
                "A variable that adds up the power of every ingredient.",
                BlockOp::SetNumber {
                    name: "total".to_string(),
                    value: 0,
                },
            ),
            BlockDefinition::new(
                "create-count",
                "Create count = 0",
                "let count = 0;",
                "A variable that counts the ingredients.",
                BlockOp::SetNumber {
                    name: "count".to_string(),
                    value: 0,
                },
            ),
            step_forward_block(),
            collect_block("collect-mushroom", EntityKind::Mushroom),
            collect_block("collect-crystal", EntityKind::Crystal),
            collect_block("collect-herbs", EntityKind::Herbs),
            collect_block("collect-water", EntityKind::Water),
            BlockDefinition::new(
                "double-total",
                "Double total",
                "total = total * 2;",
                "Multiply total by two.",
                BlockOp::Double {
                    name: "total".to_string(),
                },
            ),
            BlockDefinition::new(
                "subtract-one",
                "Subtract 1 from total",
                "total = total - 1;",
                "Take one away from total.",
                BlockOp::Subtract {
                    name: "total".to_string(),
                    amount: 1,
                },
            ),
            BlockDefinition::new(
                "divide-total-by-count",
                "Divide total by count",
                "total = total / count;",
                "Share total out evenly between the ingredients.",
                BlockOp::DivideBy {
                    name: "total".to_string(),
                    divisor: "count".to_string(),
                },
            ),
            BlockDefinition::new(
                "brew-potion",
                "Brew potion",
                "cauldron.brew(total);",
                "Brew the potion. Only works next to the cauldron.",
                BlockOp::BrewPotion,
            ),
            celebrate_block(),
        ]
    }

    fn initial_world(&self) -> WorldState {
        INGREDIENTS.iter().fold(
            WorldState::new(TRACK_LENGTH)
                .with_flag("cauldronPosition", Value::Number(CAULDRON_POSITION as i64)),
            |world, (kind, position, _)| {
                world.with_entity(Entity::new(kind.as_str(), *kind, *position))
            },
        )
    }

    fn supports_action(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::Collect { item } if power_of(*item).is_some())
            || matches!(op, BlockOp::BrewPotion)
    }

    fn is_scannable(&self, entity: &Entity) -> bool {
        is_ingredient(entity)
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, vars: &mut VariableEnv) -> StepResult {
        match op {
            BlockOp::Collect { item } => collect(*item, world, vars),
            BlockOp::BrewPotion => brew(world, vars),
            _ => StepResult::NoOp("Nothing happens in the workshop.".to_string()),
        }
    }

    fn evaluate_goal(&self, world: &WorldState, vars: &VariableEnv) -> GoalStatus {
        let missing = world
            .entities
            .iter()
            .filter(|entity| is_ingredient(entity) && !entity.resolved)
            .map(|entity| entity.kind.as_str())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return GoalStatus::Unmet(format!(
                "The recipe still needs: {}.",
                missing.join(", ")
            ));
        }

        match vars.number("total") {
            Some(TARGET_TOTAL) => GoalStatus::Met(format!(
                "All four ingredients are in and total is exactly {}. The potion is perfect!",
                TARGET_TOTAL
            )),
            Some(total) => GoalStatus::Unmet(format!(
                "total is {}, but the recipe needs exactly {}.",
                total, TARGET_TOTAL
            )),
            None => GoalStatus::Unmet(format!(
                "The recipe needs total to be {}, but total was never created.",
                TARGET_TOTAL
            )),
        }
    }
}
