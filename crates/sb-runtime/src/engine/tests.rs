use std::sync::Arc;

use sb_core::{
    BlockDefinition, BlockOp, EntityKind, FailureKind, LevelId, StepSeverity, Value, Weather,
};

use super::*;
use crate::catalog::Catalog;
use crate::level::{GoalStatus, MissingTarget, StepResult};
use crate::levels::{BridgePolicy, CollectionPolicy, CombatPolicy, CrossroadsPolicy};
use crate::pacing::NoPacing;
use crate::program::Program;

fn program(policy: &dyn LevelPolicy, ids: &[&str]) -> Vec<BlockInstance> {
    let catalog = Catalog::new(policy, policy.catalog_definitions()).expect("catalog should build");
    let mut program = Program::new();
    for id in ids {
        program.append(Arc::clone(
            catalog.definition(id).expect("block should be in catalog"),
        ));
    }
    program.list().to_vec()
}

struct Finished {
    outcome: Outcome,
    events: Vec<StepEvent>,
    world: WorldState,
    vars: VariableEnv,
}

fn run_blocks(policy: &dyn LevelPolicy, ids: &[&str]) -> Finished {
    let blocks = program(policy, ids);
    let mut world = policy.initial_world();
    let mut vars = VariableEnv::new();
    let mut events = Vec::new();
    let mut observer = |event: &StepEvent| events.push(event.clone());
    let outcome = run(
        &blocks,
        &mut world,
        &mut vars,
        policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &CancellationToken::new(),
            observer: &mut observer,
            step_delay: Duration::ZERO,
        },
    );
    Finished {
        outcome,
        events,
        world,
        vars,
    }
}

fn block_ids(events: &[StepEvent]) -> Vec<&str> {
    events.iter().map(|event| event.block_id.as_str()).collect()
}

const COLLECTION_RECIPE: [&str; 18] = [
    "create-total",
    "create-count",
    "step-forward",
    "collect-mushroom",
    "step-forward",
    "step-forward",
    "collect-crystal",
    "step-forward",
    "step-forward",
    "collect-herbs",
    "step-forward",
    "step-forward",
    "collect-water",
    "step-forward",
    "step-forward",
    "divide-total-by-count",
    "brew-potion",
    "celebrate",
];

#[test]
fn empty_program_fails_without_touching_world() {
    let policy = CollectionPolicy::new();
    let mut world = policy.initial_world();
    world.position = 5;
    let mut vars = VariableEnv::new();
    vars.set("leftover", Value::Number(3));
    let mut events = Vec::new();
    let mut observer = |event: &StepEvent| events.push(event.clone());

    let outcome = run(
        &[],
        &mut world,
        &mut vars,
        &policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &CancellationToken::new(),
            observer: &mut observer,
            step_delay: Duration::ZERO,
        },
    );

    assert_eq!(outcome.failure_kind(), Some(FailureKind::IncompleteGoal));
    assert!(events.is_empty());
    assert_eq!(world.position, 5);
    assert_eq!(vars.number("leftover"), Some(3));
}

#[test]
fn collection_recipe_succeeds() {
    let finished = run_blocks(&CollectionPolicy::new(), &COLLECTION_RECIPE);
    assert!(finished.outcome.is_success(), "{:?}", finished.outcome);
    assert_eq!(finished.vars.number("total"), Some(7));
    assert_eq!(finished.vars.number("count"), Some(4));
    assert_eq!(finished.world.position, 9);
    assert_eq!(finished.world.flag("potionStrength"), Some(&Value::Number(7)));
    assert_eq!(finished.events.len(), COLLECTION_RECIPE.len());
}

#[test]
fn collection_without_division_is_incomplete() {
    let recipe = COLLECTION_RECIPE
        .iter()
        .copied()
        .filter(|id| *id != "divide-total-by-count")
        .collect::<Vec<_>>();
    let finished = run_blocks(&CollectionPolicy::new(), &recipe);
    assert_eq!(
        finished.outcome.failure_kind(),
        Some(FailureKind::IncompleteGoal)
    );
    assert!(finished.outcome.message().contains("28"));
}

#[test]
fn using_a_variable_before_creating_it_is_missing_precondition() {
    let cases: Vec<(Box<dyn LevelPolicy>, Vec<&str>, usize)> = vec![
        (
            Box::new(CollectionPolicy::new()),
            vec!["step-forward", "collect-mushroom", "celebrate"],
            1,
        ),
        (
            Box::new(CrossroadsPolicy::new(1, None)),
            vec!["step-forward", "if-sunny", "take-mountain-path"],
            1,
        ),
        (
            Box::new(CombatPolicy::new(1, None)),
            vec!["if-goblin", "cast-fire"],
            0,
        ),
        (
            Box::new(BridgePolicy::new()),
            vec!["count-step", "step-forward"],
            0,
        ),
    ];

    for (policy, ids, failing_index) in cases {
        let finished = run_blocks(policy.as_ref(), &ids);
        assert_eq!(
            finished.outcome.failure_kind(),
            Some(FailureKind::MissingPrecondition),
            "level {}",
            policy.id()
        );
        let last = finished.events.last().expect("failing step should be reported");
        assert_eq!(last.index, failing_index);
        assert_eq!(last.severity, StepSeverity::Failure);
        assert_eq!(finished.events.len(), failing_index + 1);
    }
}

#[test]
fn gated_action_without_condition_is_missing_precondition() {
    let policy = CombatPolicy::new(1, Some(&[EntityKind::Goblin; 3][..]));
    let finished = run_blocks(
        &policy,
        &["step-forward", "step-forward", "scan-monster", "cast-fire"],
    );
    assert_eq!(
        finished.outcome.failure_kind(),
        Some(FailureKind::MissingPrecondition)
    );
    assert_eq!(finished.events.len(), 4);
}

#[test]
fn combat_wrong_spell_stops_the_run() {
    let monsters = [EntityKind::Goblin, EntityKind::Troll, EntityKind::Dragon];
    let policy = CombatPolicy::new(1, Some(&monsters[..]));
    let finished = run_blocks(
        &policy,
        &[
            "step-forward",
            "step-forward",
            "scan-monster",
            "if-goblin",
            "cast-ice",
            "celebrate",
            "step-forward",
        ],
    );
    assert_eq!(finished.outcome.failure_kind(), Some(FailureKind::WrongChoice));
    assert_eq!(
        block_ids(&finished.events),
        vec!["step-forward", "step-forward", "scan-monster", "if-goblin", "cast-ice"]
    );
    assert_eq!(finished.world.position, 2);
    assert!(!finished.world.entities[0].resolved);
}

#[test]
fn combat_clear_run_succeeds_eagerly() {
    let monsters = [EntityKind::Goblin, EntityKind::Troll, EntityKind::Dragon];
    let policy = CombatPolicy::new(1, Some(&monsters[..]));
    let finished = run_blocks(
        &policy,
        &[
            "step-forward",
            "step-forward",
            "scan-monster",
            "if-troll",
            "cast-lightning",
            "if-goblin",
            "cast-fire",
            "step-forward",
            "step-forward",
            "scan-monster",
            "if-troll",
            "cast-lightning",
            "step-forward",
            "step-forward",
            "scan-monster",
            "if-dragon",
            "cast-ice",
            "celebrate",
            "step-forward",
        ],
    );
    assert!(finished.outcome.is_success(), "{:?}", finished.outcome);
    assert_eq!(finished.events.len(), 17);
    assert_eq!(finished.events[4].severity, StepSeverity::Info);
    assert!(finished.events[4].message.contains("skipped"));
    assert_eq!(finished.world.position, 6);
}

#[test]
fn crossroads_branch_picks_the_safe_path() {
    let policy = CrossroadsPolicy::new(1, Some(Weather::Rainy));
    let finished = run_blocks(
        &policy,
        &[
            "step-forward",
            "step-forward",
            "check-weather",
            "if-sunny",
            "take-mountain-path",
            "if-rainy",
            "take-forest-path",
            "if-stormy",
            "take-cave-path",
            "step-forward",
        ],
    );
    assert!(finished.outcome.is_success(), "{:?}", finished.outcome);
    assert_eq!(
        finished.world.flag("chosenPath"),
        Some(&Value::text("forest"))
    );
    assert_eq!(finished.vars.get("weather"), Some(&Value::text("rainy")));
}

#[test]
fn crossroads_wrong_path_is_wrong_choice() {
    let policy = CrossroadsPolicy::new(1, Some(Weather::Sunny));
    let finished = run_blocks(
        &policy,
        &[
            "step-forward",
            "step-forward",
            "check-weather",
            "if-sunny",
            "take-cave-path",
        ],
    );
    assert_eq!(finished.outcome.failure_kind(), Some(FailureKind::WrongChoice));
}

#[test]
fn bridge_repeat_ten_steps_ten_times() {
    let finished = run_blocks(
        &BridgePolicy::new(),
        &["repeat-10", "step-forward", "end-loop"],
    );
    let steps = finished
        .events
        .iter()
        .filter(|event| event.block_id == "step-forward")
        .collect::<Vec<_>>();
    assert_eq!(steps.len(), 10);
    assert_eq!(
        steps
            .iter()
            .map(|event| event.iteration)
            .collect::<Vec<_>>(),
        (1..=10).map(Some).collect::<Vec<_>>()
    );
    assert_eq!(finished.world.position, 10);
    assert_eq!(finished.events.len(), 12);
    assert_eq!(
        finished.events.last().map(|event| event.block_id.as_str()),
        Some("end-loop")
    );
    assert_eq!(
        finished.outcome.failure_kind(),
        Some(FailureKind::IncompleteGoal)
    );
}

#[test]
fn bridge_while_loop_repairs_and_counts() {
    let finished = run_blocks(
        &BridgePolicy::new(),
        &[
            "create-steps",
            "repeat-while-steps-below-10",
            "step-forward",
            "repair-plank",
            "count-step",
            "end-loop",
            "celebrate",
        ],
    );
    assert!(finished.outcome.is_success(), "{:?}", finished.outcome);
    assert_eq!(finished.vars.number("steps"), Some(10));
    assert_eq!(
        finished.world.flag("planksRepaired"),
        Some(&Value::Number(10))
    );
    assert_eq!(finished.events.len(), 1 + 1 + 30 + 1 + 1);
}

#[test]
fn repeat_while_that_never_changes_is_runaway() {
    let finished = run_blocks(
        &BridgePolicy::new(),
        &[
            "create-steps",
            "repeat-while-steps-below-10",
            "step-forward",
            "end-loop",
        ],
    );
    assert_eq!(finished.outcome.failure_kind(), Some(FailureKind::RunawayLoop));
    assert_eq!(finished.events.len(), 2 + MAX_LOOP_ROUNDS as usize);
    assert_eq!(finished.world.position, 10);
    assert!(finished
        .events
        .iter()
        .skip(12)
        .all(|event| event.severity == StepSeverity::Warning));
}

#[test]
fn repeat_while_with_empty_body_is_runaway() {
    let finished = run_blocks(
        &BridgePolicy::new(),
        &["create-steps", "repeat-while-steps-below-10", "end-loop"],
    );
    assert_eq!(finished.outcome.failure_kind(), Some(FailureKind::RunawayLoop));
    assert_eq!(finished.events.len(), 2);
}

#[test]
fn repeat_while_needs_its_variable() {
    let finished = run_blocks(
        &BridgePolicy::new(),
        &["repeat-while-steps-below-10", "step-forward", "end-loop"],
    );
    assert_eq!(
        finished.outcome.failure_kind(),
        Some(FailureKind::MissingPrecondition)
    );
    assert_eq!(finished.events.len(), 1);
    assert_eq!(finished.world.position, 0);
}

#[test]
fn empty_repeat_reports_zero_rounds() {
    let finished = run_blocks(&BridgePolicy::new(), &["repeat-10", "end-loop"]);
    assert_eq!(block_ids(&finished.events), vec!["repeat-10", "end-loop"]);
    assert_eq!(finished.events[1].message, "End of loop: it ran 0 times.");
    assert_eq!(finished.world.position, 0);
}

#[test]
fn repeat_past_the_round_guard_is_runaway() {
    let policy = BridgePolicy::new();
    let blocks = [BlockOp::Repeat { times: 150 }, BlockOp::Celebrate, BlockOp::EndLoop]
        .into_iter()
        .enumerate()
        .map(|(index, op)| BlockInstance {
            instance_id: index as u64 + 1,
            definition: Arc::new(BlockDefinition::new(format!("b{}", index), "", "", "", op)),
        })
        .collect::<Vec<_>>();
    let mut world = policy.initial_world();
    let mut vars = VariableEnv::new();
    let mut events = Vec::new();
    let mut observer = |event: &StepEvent| events.push(event.clone());
    let outcome = run(
        &blocks,
        &mut world,
        &mut vars,
        &policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &CancellationToken::new(),
            observer: &mut observer,
            step_delay: Duration::ZERO,
        },
    );

    assert_eq!(outcome.failure_kind(), Some(FailureKind::RunawayLoop));
    assert!(outcome.message().contains("at most 100"));
    assert_eq!(events.len(), 1 + MAX_LOOP_ROUNDS as usize);
    assert_eq!(
        events.last().and_then(|event| event.iteration),
        Some(MAX_LOOP_ROUNDS)
    );
    assert!(events.iter().all(|event| event.block_id != "b2"));
}

/// Combat rules, except that scanning an empty square fails the run.
struct StrictScanCombat(CombatPolicy);

impl LevelPolicy for StrictScanCombat {
    fn id(&self) -> LevelId {
        self.0.id()
    }

    fn title(&self) -> &'static str {
        self.0.title()
    }

    fn default_step_delay(&self) -> Duration {
        self.0.default_step_delay()
    }

    fn catalog_definitions(&self) -> Vec<BlockDefinition> {
        self.0.catalog_definitions()
    }

    fn initial_world(&self) -> WorldState {
        self.0.initial_world()
    }

    fn supports_action(&self, op: &BlockOp) -> bool {
        self.0.supports_action(op)
    }

    fn requires_condition(&self, op: &BlockOp) -> bool {
        self.0.requires_condition(op)
    }

    fn missing_scan_target(&self) -> MissingTarget {
        MissingTarget::Fail
    }

    fn perform(&self, op: &BlockOp, world: &mut WorldState, vars: &mut VariableEnv) -> StepResult {
        self.0.perform(op, world, vars)
    }

    fn evaluate_goal(&self, world: &WorldState, vars: &VariableEnv) -> GoalStatus {
        self.0.evaluate_goal(world, vars)
    }

    fn succeeds_eagerly(&self) -> bool {
        self.0.succeeds_eagerly()
    }
}

#[test]
fn scanning_an_empty_square_follows_level_policy() {
    let lenient = run_blocks(&CombatPolicy::new(1, None), &["scan-monster", "step-forward"]);
    assert_eq!(lenient.events[0].severity, StepSeverity::Warning);
    assert_eq!(lenient.events.len(), 2);

    let strict = run_blocks(
        &StrictScanCombat(CombatPolicy::new(1, None)),
        &["scan-monster", "step-forward"],
    );
    assert_eq!(
        strict.outcome.failure_kind(),
        Some(FailureKind::MissingPrecondition)
    );
    assert!(strict.outcome.message().contains("nothing to scan on square 0"));
    assert_eq!(block_ids(&strict.events), vec!["scan-monster"]);
    assert_eq!(strict.events[0].severity, StepSeverity::Failure);
    assert_eq!(strict.world.position, 0);
}

#[test]
fn nested_loops_are_rejected_before_any_step() {
    let policy = BridgePolicy::new();
    let blocks = program(
        &policy,
        &["repeat-10", "step-forward", "repeat-5", "end-loop", "end-loop"],
    );
    let mut world = policy.initial_world();
    world.position = 3;
    let mut vars = VariableEnv::new();
    let mut count = 0;
    let mut observer = |_: &StepEvent| count += 1;
    let outcome = run(
        &blocks,
        &mut world,
        &mut vars,
        &policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &CancellationToken::new(),
            observer: &mut observer,
            step_delay: Duration::ZERO,
        },
    );
    assert_eq!(outcome.failure_kind(), Some(FailureKind::InvalidProgram));
    assert!(outcome.message().contains("Block 3"));
    assert_eq!(count, 0);
    assert_eq!(world.position, 3);
}

#[test]
fn unterminated_loop_runs_to_program_end() {
    let finished = run_blocks(&BridgePolicy::new(), &["repeat-5", "step-forward"]);
    assert_eq!(finished.events.len(), 6);
    assert_eq!(finished.world.position, 5);
}

#[test]
fn stray_end_marker_warns_and_continues() {
    let finished = run_blocks(&BridgePolicy::new(), &["end-loop", "step-forward"]);
    assert_eq!(finished.events[0].severity, StepSeverity::Warning);
    assert_eq!(finished.world.position, 1);
}

#[test]
fn stepping_past_the_end_warns_and_position_never_decreases() {
    let ids = vec!["step-forward"; 12];
    let finished = run_blocks(&BridgePolicy::new(), &ids);
    assert_eq!(finished.world.position, 10);
    assert!(finished
        .events
        .windows(2)
        .all(|pair| pair[0].world.position <= pair[1].world.position));
    assert_eq!(finished.events[10].severity, StepSeverity::Warning);
    assert_eq!(finished.events[11].severity, StepSeverity::Warning);
}

#[test]
fn division_by_zero_is_invalid_arithmetic() {
    let finished = run_blocks(
        &CollectionPolicy::new(),
        &["create-total", "create-count", "divide-total-by-count", "celebrate"],
    );
    assert_eq!(
        finished.outcome.failure_kind(),
        Some(FailureKind::InvalidArithmetic)
    );
    assert_eq!(finished.events.len(), 3);
}

#[test]
fn reset_twice_equals_reset_once() {
    let policy = CombatPolicy::new(4, None);
    let mut world = policy.initial_world();
    world.position = 6;
    world.entities[1].resolved = true;
    let mut vars = VariableEnv::new();
    vars.set("monster", Value::text("troll"));

    reset(&mut world, &mut vars, &policy);
    let once = (world.clone(), vars.clone());
    reset(&mut world, &mut vars, &policy);
    assert_eq!((world, vars), once);
    assert_eq!(once.0, policy.initial_world());
}

#[test]
fn same_seed_same_program_same_run() {
    let ids = [
        "step-forward",
        "step-forward",
        "scan-monster",
        "if-goblin",
        "cast-fire",
        "if-troll",
        "cast-lightning",
        "if-dragon",
        "cast-ice",
        "step-forward",
        "step-forward",
        "scan-monster",
        "if-goblin",
        "cast-fire",
    ];
    let first = run_blocks(&CombatPolicy::new(7, None), &ids);
    let second = run_blocks(&CombatPolicy::new(7, None), &ids);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(
        first
            .events
            .iter()
            .map(|event| &event.message)
            .collect::<Vec<_>>(),
        second
            .events
            .iter()
            .map(|event| &event.message)
            .collect::<Vec<_>>()
    );
}

#[test]
fn cancelling_mid_run_stops_after_current_step() {
    let policy = BridgePolicy::new();
    let blocks = program(&policy, &["repeat-10", "step-forward", "end-loop"]);
    let mut world = policy.initial_world();
    let mut vars = VariableEnv::new();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut events = Vec::new();
    let mut observer = |event: &StepEvent| {
        events.push(event.clone());
        if events.len() == 3 {
            trigger.cancel();
        }
    };
    let outcome = run(
        &blocks,
        &mut world,
        &mut vars,
        &policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &cancel,
            observer: &mut observer,
            step_delay: Duration::ZERO,
        },
    );
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Cancelled));
    assert_eq!(events.len(), 3);
    assert_eq!(world.position, 2);
}

#[derive(Default)]
struct Recording {
    announced: Vec<(usize, Option<u32>)>,
    executed: Vec<(usize, Option<u32>)>,
}

impl RunObserver for Recording {
    fn on_step_begin(&mut self, step: &UpcomingStep) {
        self.announced.push((step.index, step.iteration));
    }

    fn on_step(&mut self, event: &StepEvent) {
        self.executed.push((event.index, event.iteration));
    }
}

#[test]
fn every_step_is_announced_before_it_runs() {
    let policy = BridgePolicy::new();
    let blocks = program(
        &policy,
        &["create-steps", "repeat-5", "step-forward", "count-step", "end-loop"],
    );
    let mut world = policy.initial_world();
    let mut vars = VariableEnv::new();
    let mut recording = Recording::default();
    run(
        &blocks,
        &mut world,
        &mut vars,
        &policy,
        RunHooks {
            pacing: &mut NoPacing,
            cancel: &CancellationToken::new(),
            observer: &mut recording,
            step_delay: Duration::ZERO,
        },
    );
    assert_eq!(recording.announced, recording.executed);
    assert_eq!(recording.executed.len(), 1 + 1 + 10 + 1);
    assert_eq!(recording.executed[2], (2, Some(1)));
    assert_eq!(recording.executed[11], (3, Some(5)));
    assert_eq!(recording.executed[12], (4, None));
}

#[test]
fn finished_session_keeps_reporting_its_outcome() {
    let policy = BridgePolicy::new();
    let blocks = program(&policy, &["step-forward"]);
    let mut world = policy.initial_world();
    let mut vars = VariableEnv::new();
    let mut session = RunSession::new(&blocks);
    assert!(matches!(
        session.advance(&mut world, &mut vars, &policy),
        Advance::Step(_)
    ));
    let Advance::Finished(outcome) = session.advance(&mut world, &mut vars, &policy) else {
        panic!("session should finish after its last block");
    };
    assert_eq!(outcome.failure_kind(), Some(FailureKind::IncompleteGoal));
    assert_eq!(
        session.advance(&mut world, &mut vars, &policy),
        Advance::Finished(outcome)
    );
    assert!(session.upcoming().is_none());
    session.cancel();
    assert_eq!(
        session.outcome().failure_kind(),
        Some(FailureKind::IncompleteGoal)
    );
}
