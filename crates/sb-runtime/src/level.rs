use std::sync::Arc;
use std::time::Duration;

use sb_core::{
    BlockDefinition, BlockOp, Entity, EntityKind, FailureKind, InstanceId, LevelId, Outcome,
    RunReport, SpellBlocksError, StepEvent, VariableEnv, Weather, WorldState,
};
use tracing::{info, instrument, warn};

use crate::catalog::Catalog;
use crate::engine::{self, Advance, NullObserver, RunHooks, RunObserver, RunSession, UpcomingStep};
use crate::levels::policy_for;
use crate::pacing::{CancellationToken, NoPacing, Pacing};
use crate::program::Program;

pub const DEFAULT_RANDOM_SEED: u32 = 1;

/// Result of applying one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Done(String),
    /// The block had no effect. Never halts the run.
    NoOp(String),
    Fail(FailureKind, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalStatus {
    Met(String),
    Unmet(String),
}

/// What scanning an empty square does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    Warn,
    Fail,
}

/// Level-specific rules plugged into the shared engine.
pub trait LevelPolicy: Send + Sync {
    fn id(&self) -> LevelId;
    fn title(&self) -> &'static str;
    fn default_step_delay(&self) -> Duration;
    fn catalog_definitions(&self) -> Vec<BlockDefinition>;
    fn initial_world(&self) -> WorldState;

    fn allows_loops(&self) -> bool {
        false
    }

    fn supports_action(&self, op: &BlockOp) -> bool;

    /// Gated actions only run right after a condition that held.
    fn requires_condition(&self, _op: &BlockOp) -> bool {
        false
    }

    fn missing_scan_target(&self) -> MissingTarget {
        MissingTarget::Warn
    }

    fn is_scannable(&self, entity: &Entity) -> bool {
        entity.kind.is_monster()
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, vars: &mut VariableEnv) -> StepResult;

    fn evaluate_goal(&self, world: &WorldState, vars: &VariableEnv) -> GoalStatus;

    /// End the run with success as soon as the goal holds.
    fn succeeds_eagerly(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelOptions {
    pub level: LevelId,
    pub random_seed: Option<u32>,
    pub step_delay: Option<Duration>,
    pub weather: Option<Weather>,
    pub monsters: Option<Vec<EntityKind>>,
}

impl LevelOptions {
    pub fn new(level: LevelId) -> Self {
        Self {
            level,
            random_seed: None,
            step_delay: None,
            weather: None,
            monsters: None,
        }
    }

    pub fn seed(&self) -> u32 {
        self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    KeepProgram,
    ClearProgram,
}

/// Owns one level's catalog, program, world and variables, and the run in progress.
pub struct LevelController {
    options: LevelOptions,
    policy: Box<dyn LevelPolicy>,
    catalog: Catalog,
    program: Program,
    world: WorldState,
    variables: VariableEnv,
    step_delay: Duration,
    session: Option<RunSession>,
    history: Vec<StepEvent>,
}

impl LevelController {
    pub fn new(options: LevelOptions) -> Result<Self, SpellBlocksError> {
        validate_monsters(&options)?;
        let policy = policy_for(&options);
        let catalog = Catalog::new(policy.as_ref(), policy.catalog_definitions())?;
        let world = policy.initial_world();
        let step_delay = options
            .step_delay
            .unwrap_or_else(|| policy.default_step_delay());

        Ok(Self {
            options,
            policy,
            catalog,
            program: Program::new(),
            world,
            variables: VariableEnv::new(),
            step_delay,
            session: None,
            history: Vec::new(),
        })
    }

    pub fn level(&self) -> LevelId {
        self.options.level
    }

    pub fn title(&self) -> &'static str {
        self.policy.title()
    }

    pub fn options(&self) -> &LevelOptions {
        &self.options
    }

    pub fn policy(&self) -> &dyn LevelPolicy {
        self.policy.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn variables(&self) -> &VariableEnv {
        &self.variables
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn append(&mut self, block_id: &str) -> Result<InstanceId, SpellBlocksError> {
        self.ensure_editable()?;
        let definition = Arc::clone(self.catalog.definition(block_id)?);
        Ok(self.program.append(definition))
    }

    pub fn remove(&mut self, instance_id: InstanceId) -> Result<bool, SpellBlocksError> {
        self.ensure_editable()?;
        Ok(self.program.remove(instance_id))
    }

    pub fn clear_program(&mut self) -> Result<(), SpellBlocksError> {
        self.ensure_editable()?;
        self.program.clear();
        Ok(())
    }

    /// Replaces the program. Nothing changes when any id is unknown.
    pub fn load_program<S: AsRef<str>>(
        &mut self,
        block_ids: &[S],
    ) -> Result<Vec<InstanceId>, SpellBlocksError> {
        self.ensure_editable()?;
        let definitions = block_ids
            .iter()
            .map(|id| self.catalog.definition(id.as_ref()).map(Arc::clone))
            .collect::<Result<Vec<_>, _>>()?;
        self.program.clear();
        Ok(definitions
            .into_iter()
            .map(|definition| self.program.append(definition))
            .collect())
    }

    /// Abandons any run in progress and restores the initial world.
    pub fn reset(&mut self, mode: ResetMode) {
        self.abandon_run();
        self.session = None;
        self.history.clear();
        engine::reset(&mut self.world, &mut self.variables, self.policy.as_ref());
        if mode == ResetMode::ClearProgram {
            self.program.clear();
        }
    }

    /// Redraws the randomized parts of the world for later resets and runs.
    pub fn reseed(&mut self, seed: u32) -> Result<(), SpellBlocksError> {
        if self.is_running() {
            return Err(run_in_progress());
        }
        self.options.random_seed = Some(seed);
        self.policy = policy_for(&self.options);
        self.reset(ResetMode::KeepProgram);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.is_finished())
    }

    /// Begins a run that the host advances with [`LevelController::advance`].
    pub fn start_run(&mut self) -> Result<Option<UpcomingStep>, SpellBlocksError> {
        if self.is_running() {
            return Err(run_in_progress());
        }
        let session = RunSession::new(self.program.list());
        self.history.clear();
        if session.is_finished() {
            warn!(
                level = self.level().as_str(),
                blocks = self.program.len(),
                outcome = ?session.outcome(),
                "run rejected before the first step"
            );
        } else {
            engine::reset(&mut self.world, &mut self.variables, self.policy.as_ref());
            info!(
                level = self.level().as_str(),
                blocks = self.program.len(),
                "run started"
            );
        }
        let upcoming = session.upcoming();
        self.session = Some(session);
        Ok(upcoming)
    }

    pub fn upcoming(&self) -> Option<UpcomingStep> {
        self.session.as_ref().and_then(RunSession::upcoming)
    }

    pub fn advance(&mut self) -> Result<Advance, SpellBlocksError> {
        let Some(session) = self.session.as_mut() else {
            return Err(SpellBlocksError::new(
                "LEVEL_NO_ACTIVE_RUN",
                "There is no run to advance. Start a run first.",
            ));
        };
        let advance = session.advance(&mut self.world, &mut self.variables, self.policy.as_ref());
        if let Advance::Step(event) = &advance {
            self.history.push(event.clone());
        }
        Ok(advance)
    }

    /// Cancels the run in progress. Returns its final outcome, if there was one.
    pub fn abandon_run(&mut self) -> Option<Outcome> {
        if !self.is_running() {
            return None;
        }
        let session = self.session.as_mut()?;
        session.cancel();
        Some(session.outcome().clone())
    }

    pub fn history(&self) -> &[StepEvent] {
        &self.history
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.session
            .as_ref()
            .map(RunSession::outcome)
            .filter(|outcome| outcome.is_terminal())
    }

    /// Report of the last finished run.
    pub fn report(&self) -> Option<RunReport> {
        let outcome = self.last_outcome()?.clone();
        Some(RunReport {
            level: self.level(),
            outcome,
            events: self.history.clone(),
            final_world: self.world.clone(),
            final_variables: self.variables.clone(),
        })
    }

    #[instrument(skip_all, fields(level = self.options.level.as_str()))]
    pub fn run(
        &mut self,
        pacing: &mut dyn Pacing,
        cancel: &CancellationToken,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport, SpellBlocksError> {
        self.start_run()?;
        let Some(session) = self.session.as_mut() else {
            return Err(run_in_progress());
        };

        let mut recorder = Recorder {
            inner: observer,
            history: &mut self.history,
        };
        engine::drive(
            session,
            &mut self.world,
            &mut self.variables,
            self.policy.as_ref(),
            RunHooks {
                pacing,
                cancel,
                observer: &mut recorder,
                step_delay: self.step_delay,
            },
        );
        info!(
            steps = self.history.len(),
            outcome = ?session.outcome(),
            "run finished"
        );

        let outcome = session.outcome().clone();
        Ok(RunReport {
            level: self.options.level,
            outcome,
            events: self.history.clone(),
            final_world: self.world.clone(),
            final_variables: self.variables.clone(),
        })
    }

    /// Runs without pacing, cancellation or an observer.
    pub fn run_instant(&mut self) -> Result<RunReport, SpellBlocksError> {
        self.run(&mut NoPacing, &CancellationToken::new(), &mut NullObserver)
    }

    fn ensure_editable(&self) -> Result<(), SpellBlocksError> {
        if self.is_running() {
            return Err(SpellBlocksError::new(
                "LEVEL_PROGRAM_LOCKED",
                "The program cannot change while it is running.",
            ));
        }
        Ok(())
    }
}

struct Recorder<'a> {
    inner: &'a mut dyn RunObserver,
    history: &'a mut Vec<StepEvent>,
}

impl RunObserver for Recorder<'_> {
    fn on_step_begin(&mut self, step: &UpcomingStep) {
        self.inner.on_step_begin(step);
    }

    fn on_step(&mut self, event: &StepEvent) {
        self.history.push(event.clone());
        self.inner.on_step(event);
    }
}

fn run_in_progress() -> SpellBlocksError {
    SpellBlocksError::new(
        "LEVEL_RUN_IN_PROGRESS",
        "A run is already in progress. Wait for it to finish or stop it first.",
    )
}

fn validate_monsters(options: &LevelOptions) -> Result<(), SpellBlocksError> {
    let Some(monsters) = &options.monsters else {
        return Ok(());
    };
    if monsters.len() != EntityKind::MONSTERS.len() || !monsters.iter().all(EntityKind::is_monster)
    {
        return Err(SpellBlocksError::new(
            "LEVEL_MONSTERS_INVALID",
            format!(
                "Expected exactly {} monsters (goblin, troll or dragon), got [{}].",
                EntityKind::MONSTERS.len(),
                monsters
                    .iter()
                    .map(EntityKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
    Ok(())
}
