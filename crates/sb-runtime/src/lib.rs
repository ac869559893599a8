mod catalog;
mod engine;
mod level;
pub mod levels;
mod pacing;
mod program;
mod rng;

pub use catalog::Catalog;
pub use engine::{
    reset, run, Advance, NullObserver, RunHooks, RunObserver, RunSession, UpcomingStep,
    MAX_LOOP_ROUNDS,
};
pub use level::{
    GoalStatus, LevelController, LevelOptions, LevelPolicy, MissingTarget, ResetMode, StepResult,
    DEFAULT_RANDOM_SEED,
};
pub use pacing::{CancellationToken, NoPacing, Pacing, SleepPacing};
pub use program::Program;
