use std::time::Duration;

use sb_core::{BlockInstance, Outcome, StepEvent, VariableEnv, WorldState};
use tracing::{debug, info, warn};

use crate::level::LevelPolicy;
use crate::pacing::{CancellationToken, Pacing};

mod dispatch;
mod plan;
mod session;

pub use session::{Advance, RunSession, UpcomingStep, MAX_LOOP_ROUNDS};

/// Receives step notifications in order, on the thread that drives the run.
pub trait RunObserver {
    fn on_step_begin(&mut self, _step: &UpcomingStep) {}
    fn on_step(&mut self, event: &StepEvent);
}

impl<F> RunObserver for F
where
    F: FnMut(&StepEvent),
{
    fn on_step(&mut self, event: &StepEvent) {
        self(event)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_step(&mut self, _event: &StepEvent) {}
}

pub struct RunHooks<'a> {
    pub pacing: &'a mut dyn Pacing,
    pub cancel: &'a CancellationToken,
    pub observer: &'a mut dyn RunObserver,
    pub step_delay: Duration,
}

/// Restores the level's initial world and an empty variable environment.
pub fn reset(world: &mut WorldState, vars: &mut VariableEnv, policy: &dyn LevelPolicy) {
    *world = policy.initial_world();
    vars.clear();
}

/// Runs `program` to completion against a freshly reset world.
///
/// Programs rejected before the first step (empty, nested loops) leave `world` and `vars`
/// untouched.
pub fn run(
    program: &[BlockInstance],
    world: &mut WorldState,
    vars: &mut VariableEnv,
    policy: &dyn LevelPolicy,
    hooks: RunHooks<'_>,
) -> Outcome {
    let mut session = RunSession::new(program);
    if session.is_finished() {
        warn!(
            level = policy.id().as_str(),
            blocks = program.len(),
            outcome = ?session.outcome(),
            "run rejected before the first step"
        );
        return session.outcome().clone();
    }

    reset(world, vars, policy);
    info!(
        level = policy.id().as_str(),
        blocks = program.len(),
        "run started"
    );
    drive(&mut session, world, vars, policy, hooks);
    info!(
        level = policy.id().as_str(),
        steps = session.executed_steps(),
        outcome = ?session.outcome(),
        "run finished"
    );
    session.outcome().clone()
}

/// Advances an already started session until it ends.
pub(crate) fn drive(
    session: &mut RunSession,
    world: &mut WorldState,
    vars: &mut VariableEnv,
    policy: &dyn LevelPolicy,
    hooks: RunHooks<'_>,
) {
    let RunHooks {
        pacing,
        cancel,
        observer,
        step_delay,
    } = hooks;

    loop {
        if cancel.is_cancelled() {
            warn!(level = policy.id().as_str(), "run cancelled");
            session.cancel();
            return;
        }
        if let Some(step) = session.upcoming() {
            observer.on_step_begin(&step);
            pacing.pause(step_delay, cancel);
            if cancel.is_cancelled() {
                warn!(level = policy.id().as_str(), "run cancelled");
                session.cancel();
                return;
            }
        }

        match session.advance(world, vars, policy) {
            Advance::Step(event) => {
                debug!(
                    index = event.index,
                    round = ?event.iteration,
                    block = event.block_id.as_str(),
                    severity = event.severity.as_str(),
                    "step"
                );
                observer.on_step(&event);
            }
            Advance::Finished(_) => return,
        }
    }
}

#[cfg(test)]
mod tests;
