use std::time::Duration;

use sb_core::{
    BlockDefinition, BlockOp, Comparison, FailureKind, LevelId, PathChoice, Value, VariableEnv,
    Weather, WorldState,
};

use super::{celebrate_block, step_forward_block};
use crate::level::{GoalStatus, LevelPolicy, StepResult};
use crate::rng::pick;

const TRACK_LENGTH: usize = 6;
const FORK_POSITION: usize = 2;

/// Weather Crossroads: read the sky and pick the one safe path at the fork.
#[derive(Debug, Clone)]
pub struct CrossroadsPolicy {
    weather: Weather,
}

impl CrossroadsPolicy {
    /// `weather` overrides the seeded draw.
    pub fn new(seed: u32, weather: Option<Weather>) -> Self {
        let weather = weather.unwrap_or_else(|| {
            let mut state = seed;
            pick(&mut state, &Weather::ALL)
        });
        Self { weather }
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }
}

fn safe_path(weather: Weather) -> PathChoice {
    match weather {
        Weather::Sunny => PathChoice::Mountain,
        Weather::Rainy => PathChoice::Forest,
        Weather::Stormy => PathChoice::Cave,
    }
}

fn take_path(weather: Weather, path: PathChoice, world: &mut WorldState) -> StepResult {
    if world.flag("chosenPath").is_some() {
        return StepResult::NoOp("The wizard has already chosen a path.".to_string());
    }
    if world.position != FORK_POSITION {
        return StepResult::NoOp(format!(
            "The paths split at square {}, but the wizard is on square {}.",
            FORK_POSITION, world.position
        ));
    }

    world.set_flag("chosenPath", Value::text(path.as_str()));
    let expected = safe_path(weather);
    if path != expected {
        return StepResult::Fail(
            FailureKind::WrongChoice,
            format!(
                "The {} path is not safe when it is {}. The {} path was the right choice.",
                path.as_str(),
                weather.as_str(),
                expected.as_str()
            ),
        );
    }
    StepResult::Done(format!(
        "The wizard takes the {} path. Just right for {} weather!",
        path.as_str(),
        weather.as_str()
    ))
}

impl LevelPolicy for CrossroadsPolicy {
    fn id(&self) -> LevelId {
        LevelId::Crossroads
    }

    fn title(&self) -> &'static str {
        "Weather Crossroads"
    }

    fn default_step_delay(&self) -> Duration {
        Duration::from_millis(1200)
    }

    fn catalog_definitions(&self) -> Vec<BlockDefinition> {
        let if_block = |weather: Weather| {
            BlockDefinition::new(
                format!("if-{}", weather.as_str()),
                format!("If it is {}", weather.as_str()),
                format!("if (weather === \"{}\")", weather.as_str()),
                format!(
                    "Only run the next action when the weather is {}.",
                    weather.as_str()
                ),
                BlockOp::Compare {
                    name: "weather".to_string(),
                    comparison: Comparison::Equals,
                    value: Value::text(weather.as_str()),
                },
            )
        };
        let path_block = |path: PathChoice| {
            BlockDefinition::new(
                format!("take-{}-path", path.as_str()),
                format!("Take the {} path", path.as_str()),
                format!("wizard.takePath(\"{}\");", path.as_str()),
                format!(
                    "Walk down the {} path. Only do this after an \"if\" block.",
                    path.as_str()
                ),
                BlockOp::TakePath { path },
            )
        };

        vec![
            step_forward_block(),
            BlockDefinition::new(
                "check-weather",
                "Check the weather",
                "let weather = sky.weather;",
                "Look at the sky and remember the weather in a variable.",
                BlockOp::ReadFlag {
                    flag: "weather".to_string(),
                    into: "weather".to_string(),
                },
            ),
            if_block(Weather::Sunny),
            if_block(Weather::Rainy),
            if_block(Weather::Stormy),
            path_block(PathChoice::Mountain),
            path_block(PathChoice::Forest),
            path_block(PathChoice::Cave),
            celebrate_block(),
        ]
    }

    fn initial_world(&self) -> WorldState {
        WorldState::new(TRACK_LENGTH)
            .with_flag("weather", Value::text(self.weather.as_str()))
            .with_flag("forkPosition", Value::Number(FORK_POSITION as i64))
    }

    fn supports_action(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::TakePath { .. })
    }

    fn requires_condition(&self, op: &BlockOp) -> bool {
        matches!(op, BlockOp::TakePath { .. })
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, _vars: &mut VariableEnv) -> StepResult {
        match op {
            BlockOp::TakePath { path } => take_path(self.weather, *path, world),
            _ => StepResult::NoOp("Nothing happens at the crossroads.".to_string()),
        }
    }

    fn evaluate_goal(&self, world: &WorldState, _vars: &VariableEnv) -> GoalStatus {
        let expected = safe_path(self.weather);
        match world.flag("chosenPath").and_then(Value::as_text) {
            Some(chosen) if chosen == expected.as_str() => GoalStatus::Met(format!(
                "It is {} and the wizard took the {} path. Safe travels!",
                self.weather.as_str(),
                chosen
            )),
            Some(chosen) => GoalStatus::Unmet(format!(
                "The wizard took the {} path, but in {} weather the {} path is the safe one.",
                chosen,
                self.weather.as_str(),
                expected.as_str()
            )),
            None => GoalStatus::Unmet(format!(
                "The wizard never chose a path at the fork on square {}.",
                FORK_POSITION
            )),
        }
    }
}
