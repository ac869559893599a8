use std::sync::Arc;

use sb_core::{
    BlockInstance, BlockOp, FailureKind, InstanceId, Outcome, StepEvent, StepSeverity,
    VariableEnv, WorldState,
};

use super::plan::{build_plan, PlanItem};
use crate::level::{GoalStatus, LevelPolicy, StepResult};

/// Upper bound on rounds of a single loop.
pub const MAX_LOOP_ROUNDS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingStep {
    pub index: usize,
    pub iteration: Option<u32>,
    pub instance_id: InstanceId,
    pub block_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Step(StepEvent),
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Item(usize),
    Body {
        item: usize,
        round: u32,
        offset: usize,
    },
    Close {
        item: usize,
        end: usize,
        rounds: u32,
    },
    Done,
}

/// One run of a program, advanced one block at a time.
///
/// The cursor always points at a block that will produce a [`StepEvent`], or at `Done`,
/// so hosts can announce the upcoming block before pacing.
#[derive(Debug, Clone)]
pub struct RunSession {
    program: Vec<BlockInstance>,
    plan: Vec<PlanItem>,
    cursor: Cursor,
    pub(super) pending_condition: Option<bool>,
    outcome: Outcome,
    executed: usize,
}

impl RunSession {
    pub fn new(program: &[BlockInstance]) -> Self {
        let program = program.to_vec();
        if program.is_empty() {
            return Self::finished(
                program,
                Outcome::failure(
                    FailureKind::IncompleteGoal,
                    "The program is empty. Add some blocks and run it again.",
                ),
            );
        }

        match build_plan(&program) {
            Ok(plan) => Self {
                program,
                plan,
                cursor: Cursor::Item(0),
                pending_condition: None,
                outcome: Outcome::StillRunning,
                executed: 0,
            },
            Err(nested) => {
                let reason = format!(
                    "Block {} (\"{}\") starts a loop inside the loop that begins at block {}. Loops inside loops are not supported.",
                    nested.inner + 1,
                    program[nested.inner].definition.label,
                    nested.outer + 1
                );
                Self::finished(
                    program,
                    Outcome::failure(FailureKind::InvalidProgram, reason),
                )
            }
        }
    }

    fn finished(program: Vec<BlockInstance>, outcome: Outcome) -> Self {
        Self {
            program,
            plan: Vec::new(),
            cursor: Cursor::Done,
            pending_condition: None,
            outcome,
            executed: 0,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn executed_steps(&self) -> usize {
        self.executed
    }

    pub fn program(&self) -> &[BlockInstance] {
        &self.program
    }

    pub fn upcoming(&self) -> Option<UpcomingStep> {
        if self.is_finished() {
            return None;
        }
        let (index, iteration) = match self.cursor {
            Cursor::Item(item) => match &self.plan[item] {
                PlanItem::Single(index) => (*index, None),
                PlanItem::Loop { header, .. } => (*header, None),
            },
            Cursor::Body {
                item,
                round,
                offset,
            } => match &self.plan[item] {
                PlanItem::Loop { body, .. } => (body[offset], Some(round)),
                PlanItem::Single(index) => (*index, None),
            },
            Cursor::Close { end, .. } => (end, None),
            Cursor::Done => return None,
        };
        let instance = &self.program[index];
        Some(UpcomingStep {
            index,
            iteration,
            instance_id: instance.instance_id,
            block_id: instance.block_id().to_string(),
        })
    }

    /// Stops the run with a `Cancelled` failure unless it already ended.
    pub fn cancel(&mut self) {
        if self.is_finished() {
            return;
        }
        self.cursor = Cursor::Done;
        self.outcome = Outcome::failure(
            FailureKind::Cancelled,
            "The run was stopped before it finished.",
        );
    }

    pub fn advance(
        &mut self,
        world: &mut WorldState,
        vars: &mut VariableEnv,
        policy: &dyn LevelPolicy,
    ) -> Advance {
        if self.is_finished() {
            return Advance::Finished(self.outcome.clone());
        }

        let event = match self.cursor {
            Cursor::Done => {
                self.outcome = match policy.evaluate_goal(world, vars) {
                    GoalStatus::Met(message) => Outcome::success(message),
                    GoalStatus::Unmet(reason) => {
                        Outcome::failure(FailureKind::IncompleteGoal, reason)
                    }
                };
                return Advance::Finished(self.outcome.clone());
            }
            Cursor::Item(item) => match self.plan[item].clone() {
                PlanItem::Single(index) => {
                    let event = self.execute(index, None, world, vars, policy);
                    self.cursor = self.item_cursor(item + 1);
                    event
                }
                PlanItem::Loop { header, .. } => {
                    let event = self.execute(header, None, world, vars, policy);
                    if !self.is_finished() {
                        self.cursor = self.enter_round(item, 1, vars);
                    }
                    event
                }
            },
            Cursor::Body {
                item,
                round,
                offset,
            } => {
                let Some((index, body_len)) = self.body_step(item, offset) else {
                    self.cursor = self.item_cursor(item + 1);
                    return self.advance(world, vars, policy);
                };
                let event = self.execute(index, Some(round), world, vars, policy);
                if !self.is_finished() {
                    self.cursor = if offset + 1 < body_len {
                        Cursor::Body {
                            item,
                            round,
                            offset: offset + 1,
                        }
                    } else {
                        self.enter_round(item, round + 1, vars)
                    };
                }
                event
            }
            Cursor::Close { item, end, rounds } => {
                let message = format!(
                    "End of loop: it ran {} time{}.",
                    rounds,
                    if rounds == 1 { "" } else { "s" }
                );
                let event = self.emit(end, None, StepResult::Done(message), world, vars);
                self.cursor = self.item_cursor(item + 1);
                event
            }
        };

        if !self.is_finished() && policy.succeeds_eagerly() {
            if let GoalStatus::Met(message) = policy.evaluate_goal(world, vars) {
                self.cursor = Cursor::Done;
                self.outcome = Outcome::success(message);
            }
        }

        Advance::Step(event)
    }

    fn item_cursor(&self, item: usize) -> Cursor {
        if item < self.plan.len() {
            Cursor::Item(item)
        } else {
            Cursor::Done
        }
    }

    fn body_step(&self, item: usize, offset: usize) -> Option<(usize, usize)> {
        match &self.plan[item] {
            PlanItem::Loop { body, .. } => body.get(offset).map(|index| (*index, body.len())),
            PlanItem::Single(_) => None,
        }
    }

    fn close_cursor(&self, item: usize, rounds: u32) -> Cursor {
        match &self.plan[item] {
            PlanItem::Loop { end: Some(end), .. } => Cursor::Close {
                item,
                end: *end,
                rounds,
            },
            _ => self.item_cursor(item + 1),
        }
    }

    /// Decides whether round `round` of the loop at plan item `item` runs.
    fn enter_round(&mut self, item: usize, round: u32, vars: &VariableEnv) -> Cursor {
        let PlanItem::Loop { header, body, .. } = &self.plan[item] else {
            return self.item_cursor(item + 1);
        };
        let body_is_empty = body.is_empty();
        let op = self.program[*header].definition.op.clone();

        match op {
            BlockOp::Repeat { times } => {
                if body_is_empty {
                    return self.close_cursor(item, 0);
                }
                if round > times {
                    return self.close_cursor(item, times);
                }
                if round > MAX_LOOP_ROUNDS {
                    return self.stop(
                        FailureKind::RunawayLoop,
                        format!("A repeat loop can run at most {} times.", MAX_LOOP_ROUNDS),
                    );
                }
            }
            BlockOp::RepeatWhile { name, below } => {
                let Some(value) = vars.number(&name) else {
                    return self.stop(
                        FailureKind::MissingPrecondition,
                        format!(
                            "The loop checks `{}`, but nothing has created it yet.",
                            name
                        ),
                    );
                };
                if value >= below {
                    return self.close_cursor(item, round - 1);
                }
                if body_is_empty {
                    return self.stop(
                        FailureKind::RunawayLoop,
                        format!(
                            "The loop has nothing inside it, so `{}` never changes and the loop would never end.",
                            name
                        ),
                    );
                }
                if round > MAX_LOOP_ROUNDS {
                    return self.stop(
                        FailureKind::RunawayLoop,
                        format!(
                            "The loop ran {} times and `{}` is still below {}. Does something inside the loop change `{}`?",
                            MAX_LOOP_ROUNDS, name, below, name
                        ),
                    );
                }
            }
            _ => return self.item_cursor(item + 1),
        }

        Cursor::Body {
            item,
            round,
            offset: 0,
        }
    }

    fn stop(&mut self, kind: FailureKind, reason: String) -> Cursor {
        self.outcome = Outcome::failure(kind, reason);
        Cursor::Done
    }

    fn execute(
        &mut self,
        index: usize,
        iteration: Option<u32>,
        world: &mut WorldState,
        vars: &mut VariableEnv,
        policy: &dyn LevelPolicy,
    ) -> StepEvent {
        let definition = Arc::clone(&self.program[index].definition);
        let result = self.dispatch(&definition, world, vars, policy);
        self.emit(index, iteration, result, world, vars)
    }

    fn emit(
        &mut self,
        index: usize,
        iteration: Option<u32>,
        result: StepResult,
        world: &WorldState,
        vars: &VariableEnv,
    ) -> StepEvent {
        self.executed += 1;
        let (severity, message) = match result {
            StepResult::Done(message) => (StepSeverity::Info, message),
            StepResult::NoOp(message) => (StepSeverity::Warning, message),
            StepResult::Fail(kind, message) => {
                self.cursor = Cursor::Done;
                self.outcome = Outcome::failure(kind, message.clone());
                (StepSeverity::Failure, message)
            }
        };

        let instance = &self.program[index];
        StepEvent {
            index,
            iteration,
            instance_id: instance.instance_id,
            block_id: instance.block_id().to_string(),
            label: instance.definition.label.clone(),
            message,
            severity,
            world: world.clone(),
            variables: vars.clone(),
        }
    }
}
