use std::time::Duration;

use sb_core::{EntityKind, LevelId, RunReport, SpellBlocksError, Weather};
use sb_runtime::{LevelController, LevelOptions};

pub use sb_runtime::levels::policy_for;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLevelOptions {
    pub level: String,
    pub blocks: Option<Vec<String>>,
    pub random_seed: Option<u32>,
    pub step_delay: Option<Duration>,
    pub weather: Option<String>,
    pub monsters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgramOptions {
    pub level: String,
    pub blocks: Vec<String>,
    pub random_seed: Option<u32>,
    pub weather: Option<String>,
    pub monsters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    pub id: LevelId,
    pub title: &'static str,
    pub default_step_delay: Duration,
}

pub fn list_levels() -> Vec<LevelSummary> {
    LevelId::ALL
        .into_iter()
        .map(|id| {
            let policy = policy_for(&LevelOptions::new(id));
            LevelSummary {
                id,
                title: policy.title(),
                default_step_delay: policy.default_step_delay(),
            }
        })
        .collect()
}

pub fn parse_level(raw: &str) -> Result<LevelId, SpellBlocksError> {
    LevelId::parse(raw).ok_or_else(|| {
        SpellBlocksError::new(
            "API_LEVEL_NOT_FOUND",
            format!(
                "Unknown level \"{}\". Expected one of: {}.",
                raw,
                LevelId::ALL
                    .iter()
                    .map(LevelId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
    })
}

pub fn parse_weather(raw: &str) -> Result<Weather, SpellBlocksError> {
    Weather::parse(raw).ok_or_else(|| {
        SpellBlocksError::new(
            "API_WEATHER_INVALID",
            format!(
                "Unknown weather \"{}\". Expected sunny, rainy or stormy.",
                raw
            ),
        )
    })
}

pub fn parse_monsters<S: AsRef<str>>(raw: &[S]) -> Result<Vec<EntityKind>, SpellBlocksError> {
    raw.iter()
        .map(|name| {
            EntityKind::parse(name.as_ref())
                .filter(EntityKind::is_monster)
                .ok_or_else(|| {
                    SpellBlocksError::new(
                        "API_MONSTER_INVALID",
                        format!(
                            "Unknown monster \"{}\". Expected goblin, troll or dragon.",
                            name.as_ref()
                        ),
                    )
                })
        })
        .collect()
}

pub fn create_level(options: CreateLevelOptions) -> Result<LevelController, SpellBlocksError> {
    let level = parse_level(&options.level)?;
    let weather = options.weather.as_deref().map(parse_weather).transpose()?;
    let monsters = options
        .monsters
        .as_deref()
        .map(parse_monsters)
        .transpose()?;

    let mut controller = LevelController::new(LevelOptions {
        level,
        random_seed: options.random_seed,
        step_delay: options.step_delay,
        weather,
        monsters,
    })?;

    if let Some(blocks) = &options.blocks {
        controller.load_program(blocks)?;
    }
    Ok(controller)
}

/// Builds the level, loads `blocks` and runs them without pacing.
pub fn run_program(options: RunProgramOptions) -> Result<RunReport, SpellBlocksError> {
    let mut controller = create_level(CreateLevelOptions {
        level: options.level,
        blocks: Some(options.blocks),
        random_seed: options.random_seed,
        step_delay: Some(Duration::ZERO),
        weather: options.weather,
        monsters: options.monsters,
    })?;
    controller.run_instant()
}
