use std::time::Duration;

use sb_core::{
    BlockDefinition, BlockOp, Comparison, Entity, EntityKind, FailureKind, LevelId, Spell, Value,
    VariableEnv, WorldState,
};

use super::{celebrate_block, step_forward_block};
use crate::level::{GoalStatus, LevelPolicy, StepResult};
use crate::rng::pick;

const TRACK_LENGTH: usize = 8;
const MONSTER_POSITIONS: [usize; 3] = [2, 4, 6];

/// Monster Gauntlet: scan each monster and answer with the spell it is weak to.
#[derive(Debug, Clone)]
pub struct CombatPolicy {
    monsters: [EntityKind; 3],
}

impl CombatPolicy {
    /// A full set of three monsters in `fixed` overrides the seeded draw.
    pub fn new(seed: u32, fixed: Option<&[EntityKind]>) -> Self {
        let mut state = seed;
        let mut monsters = [EntityKind::Goblin; 3];
        for (slot, monster) in monsters.iter_mut().enumerate() {
            *monster = match fixed.and_then(|fixed| fixed.get(slot)) {
                Some(kind) if kind.is_monster() => *kind,
                _ => pick(&mut state, &EntityKind::MONSTERS),
            };
        }
        Self { monsters }
    }

    pub fn monsters(&self) -> [EntityKind; 3] {
        self.monsters
    }
}

fn weakness(kind: EntityKind) -> Option<Spell> {
    match kind {
        EntityKind::Goblin => Some(Spell::Fire),
        EntityKind::Troll => Some(Spell::Lightning),
        EntityKind::Dragon => Some(Spell::Ice),
        _ => None,
    }
}

fn cast(spell: Spell, world: &mut WorldState) -> StepResult {
    let target = world
        .target
        .as_deref()
        .and_then(|id| world.entity(id))
        .filter(|entity| !entity.resolved && entity.position == world.position)
        .map(|entity| (entity.id.clone(), entity.kind));
    let Some((id, kind)) = target else {
        return StepResult::Fail(
            FailureKind::MissingPrecondition,
            format!(
                "The wizard has no scanned monster to cast {} at. Scan first.",
                spell.as_str()
            ),
        );
    };

    match weakness(kind) {
        Some(expected) if expected == spell => {
            world.resolve(&id);
            world.target = None;
            StepResult::Done(format!(
                "The {} spell defeats the {}!",
                spell.as_str(),
                kind
            ))
        }
        Some(expected) => StepResult::Fail(
            FailureKind::WrongChoice,
            format!(
                "{} does nothing to the {}! A {} is weak to {}.",
                spell.as_str(),
                kind,
                kind,
                expected.as_str()
            ),
        ),
        None => StepResult::NoOp(format!("The {} is not a monster.", kind)),
    }
}

impl LevelPolicy for CombatPolicy {
    fn id(&self) -> LevelId {
        LevelId::Combat
    }

    fn title(&self) -> &'static str {
        "Monster Gauntlet"
    }

    fn default_step_delay(&self) -> Duration {
        Duration::from_millis(1400)
    }

    fn catalog_definitions(&self) -> Vec<BlockDefinition> {
        let if_block = |kind: EntityKind| {
            BlockDefinition::new(
                format!("if-{}", kind),
                format!("If it is a {}", kind),
                format!("if (monster === \"{}\")", kind),
                format!("Only run the next spell when the monster is a {}.", kind),
                BlockOp::Compare {
                    name: "monster".to_string(),
                    comparison: Comparison::Equals,
                    value: Value::text(kind.as_str()),
                },
            )
        };
        let spell_block = |spell: Spell| {
            BlockDefinition::new(
                format!("cast-{}", spell.as_str()),
                format!("Cast {}", spell.as_str()),
                format!("wizard.cast(\"{}\");", spell.as_str()),
                format!(
                    "Cast a {} spell at the scanned monster. Only do this after an \"if\" block.",
                    spell.as_str()
                ),
                BlockOp::CastSpell { spell },
            )
        };

        vec![
            step_forward_block(),
            BlockDefinition::new(
                "scan-monster",
                "Scan for monsters",
                "let monster = wizard.scan();",
                "Look at the monster on this square and remember what it is.",
                BlockOp::ScanEntity {
                    into: "monster".to_string(),
                },
            ),
            if_block(EntityKind::Goblin),
            if_block(EntityKind::Troll),
            if_block(EntityKind::Dragon),
            spell_block(Spell::Fire),
            spell_block(Spell::Ice),
            spell_block(Spell::Lightning),
            celebrate_block(),
        ]
    }

    fn initial_world(&self) -> WorldState {
        self.monsters
            .iter()
            .zip(MONSTER_POSITIONS)
            .enumerate()
            .fold(WorldState::new(TRACK_LENGTH), |world, (slot, (kind, position))| {
                world.with_entity(Entity::new(format!("monster-{}", slot + 1), *kind, position))
            })
    }

    fn supports_action(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::CastSpell { .. })
    }

    fn requires_condition(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::CastSpell { .. })
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, _vars: &mut VariableEnv) -> StepResult {
        match op {
            BlockOp::CastSpell { spell } => cast(*spell, world),
            _ => StepResult::NoOp("Nothing happens in the gauntlet.".to_string()),
        }
    }

    fn evaluate_goal(&self, world: &WorldState, _vars: &VariableEnv) -> GoalStatus {
        let standing = world
            .entities
            .iter()
            .filter(|entity| entity.kind.is_monster() && !entity.resolved)
            .count();
        if standing == 0 {
            GoalStatus::Met("Every monster is defeated. The gauntlet is clear!".to_string())
        } else {
            GoalStatus::Unmet(format!(
                "{} of {} monsters are still standing.",
                standing,
                MONSTER_POSITIONS.len()
            ))
        }
    }

    fn succeeds_eagerly(&self) -> bool {
        true
    }
}
