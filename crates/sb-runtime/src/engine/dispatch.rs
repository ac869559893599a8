use sb_core::{BlockDefinition, BlockOp, Category, FailureKind, Value, VariableEnv, WorldState};

use super::session::RunSession;
use crate::level::{LevelPolicy, MissingTarget, StepResult};

impl RunSession {
    /// Applies one block to the world and the variables.
    pub(super) fn dispatch(
        &mut self,
        definition: &BlockDefinition,
        world: &mut WorldState,
        vars: &mut VariableEnv,
        policy: &dyn LevelPolicy,
    ) -> StepResult {
        match definition.category {
            Category::Action => self.dispatch_action(definition, world, vars, policy),
            Category::Condition => self.dispatch_condition(definition, vars),
            Category::Variable => dispatch_variable(definition, world, vars, policy),
            Category::Movement => dispatch_movement(world),
            Category::Math => dispatch_math(definition, vars),
            Category::Loop => dispatch_loop_header(definition, vars),
            Category::Structure => StepResult::NoOp(
                "This end-of-loop marker has no loop above it, so it does nothing.".to_string(),
            ),
        }
    }

    fn dispatch_condition(&mut self, definition: &BlockDefinition, vars: &VariableEnv) -> StepResult {
        let BlockOp::Compare {
            name,
            comparison,
            value,
        } = &definition.op
        else {
            return StepResult::NoOp(format!("\"{}\" has nothing to check.", definition.label));
        };

        let Some(current) = vars.get(name) else {
            return missing_variable(&definition.label, name);
        };
        let met = comparison.holds(current, value);
        self.pending_condition = Some(met);
        StepResult::Done(format!(
            "Is {} {} {}? {} is {}, so the answer is {}.",
            name,
            comparison.symbol(),
            value,
            name,
            current,
            if met { "yes" } else { "no" }
        ))
    }

    fn dispatch_action(
        &mut self,
        definition: &BlockDefinition,
        world: &mut WorldState,
        vars: &mut VariableEnv,
        policy: &dyn LevelPolicy,
    ) -> StepResult {
        let condition = self.pending_condition.take();

        if matches!(definition.op, BlockOp::Celebrate) {
            return StepResult::Done("The wizard celebrates with a shower of sparkles!".to_string());
        }

        if policy.requires_condition(&definition.op) {
            match condition {
                None => {
                    return StepResult::Fail(
                        FailureKind::MissingPrecondition,
                        format!(
                            "\"{}\" needs a check right before it. Add an \"if\" block first.",
                            definition.label
                        ),
                    )
                }
                Some(false) => {
                    return StepResult::Done(format!(
                        "The check said no, so \"{}\" is skipped.",
                        definition.label
                    ))
                }
                Some(true) => {}
            }
        }

        policy.perform(&definition.op, world, vars)
    }
}

fn dispatch_variable(
    definition: &BlockDefinition,
    world: &mut WorldState,
    vars: &mut VariableEnv,
    policy: &dyn LevelPolicy,
) -> StepResult {
    match &definition.op {
        BlockOp::SetNumber { name, value } => {
            vars.set(name.clone(), Value::Number(*value));
            StepResult::Done(format!("{} = {}", name, value))
        }
        BlockOp::ScanEntity { into } => {
            let found = world
                .unresolved_here(|entity| policy.is_scannable(entity))
                .map(|entity| (entity.id.clone(), entity.kind));
            match found {
                Some((id, kind)) => {
                    vars.set(into.clone(), Value::text(kind.as_str()));
                    world.target = Some(id);
                    StepResult::Done(format!(
                        "The wizard spots a {} on square {}. {} = \"{}\"",
                        kind, world.position, into, kind
                    ))
                }
                None => {
                    let message = format!("There is nothing to scan on square {}.", world.position);
                    match policy.missing_scan_target() {
                        MissingTarget::Warn => StepResult::NoOp(message),
                        MissingTarget::Fail => {
                            StepResult::Fail(FailureKind::MissingPrecondition, message)
                        }
                    }
                }
            }
        }
        BlockOp::ReadFlag { flag, into } => match world.flag(flag) {
            Some(value) => {
                vars.set(into.clone(), value.clone());
                StepResult::Done(format!("The wizard looks at the {}. {} = {}", flag, into, value))
            }
            None => StepResult::Fail(
                FailureKind::MissingPrecondition,
                format!("There is no {} to read here.", flag),
            ),
        },
        _ => StepResult::NoOp(format!("\"{}\" does not set anything.", definition.label)),
    }
}

fn dispatch_movement(world: &mut WorldState) -> StepResult {
    if world.at_track_end() {
        return StepResult::NoOp(format!(
            "The wizard is already at the end of the path (square {}).",
            world.position
        ));
    }
    world.position += 1;
    world.target = None;
    StepResult::Done(format!("The wizard steps forward to square {}.", world.position))
}

fn dispatch_math(definition: &BlockDefinition, vars: &mut VariableEnv) -> StepResult {
    let label = definition.label.as_str();
    let (name, result, shown) = match &definition.op {
        BlockOp::Double { name } => {
            let current = match number_var(label, vars, name) {
                Ok(current) => current,
                Err(result) => return result,
            };
            (name, current.checked_mul(2), format!("{} = {} × 2", name, current))
        }
        BlockOp::Add { name, amount } => {
            let current = match number_var(label, vars, name) {
                Ok(current) => current,
                Err(result) => return result,
            };
            (
                name,
                current.checked_add(*amount),
                format!("{} = {} + {}", name, current, amount),
            )
        }
        BlockOp::Subtract { name, amount } => {
            let current = match number_var(label, vars, name) {
                Ok(current) => current,
                Err(result) => return result,
            };
            (
                name,
                current.checked_sub(*amount),
                format!("{} = {} - {}", name, current, amount),
            )
        }
        BlockOp::DivideBy { name, divisor } => {
            let current = match number_var(label, vars, name) {
                Ok(current) => current,
                Err(result) => return result,
            };
            let by = match number_var(label, vars, divisor) {
                Ok(by) => by,
                Err(result) => return result,
            };
            if by == 0 {
                return StepResult::Fail(
                    FailureKind::InvalidArithmetic,
                    format!(
                        "Cannot divide {} by {} because {} is 0.",
                        name, divisor, divisor
                    ),
                );
            }
            (
                name,
                current.checked_div(by),
                format!("{} = {} ÷ {}", name, current, by),
            )
        }
        _ => return StepResult::NoOp(format!("\"{}\" does no math.", label)),
    };

    match result {
        Some(value) => {
            vars.set(name.clone(), Value::Number(value));
            StepResult::Done(format!("{} = {}", shown, value))
        }
        None => StepResult::Fail(
            FailureKind::InvalidArithmetic,
            format!("{} is too big for the wizard to count.", name),
        ),
    }
}

fn dispatch_loop_header(definition: &BlockDefinition, vars: &VariableEnv) -> StepResult {
    match &definition.op {
        BlockOp::Repeat { times } => StepResult::Done(format!("Repeat {} times:", times)),
        BlockOp::RepeatWhile { name, below } => match vars.number(name) {
            Some(current) => StepResult::Done(format!(
                "Repeat while {} < {} ({} is {} now):",
                name, below, name, current
            )),
            None => missing_variable(&definition.label, name),
        },
        _ => StepResult::NoOp(format!("\"{}\" is not a loop.", definition.label)),
    }
}

fn number_var(label: &str, vars: &VariableEnv, name: &str) -> Result<i64, StepResult> {
    match vars.get(name) {
        Some(Value::Number(value)) => Ok(*value),
        Some(other) => Err(StepResult::Fail(
            FailureKind::MissingPrecondition,
            format!("{} holds {}, which is not a number.", name, other),
        )),
        None => Err(missing_variable(label, name)),
    }
}

pub(crate) fn missing_variable(label: &str, name: &str) -> StepResult {
    StepResult::Fail(
        FailureKind::MissingPrecondition,
        format!(
            "\"{}\" uses the variable {}, but nothing has created it yet. Add a block that sets {} before this one.",
            label, name, name
        ),
    )
}
