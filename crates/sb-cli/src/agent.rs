use std::path::Path;
use std::time::Duration;

use sb_api::{create_level, list_levels, CreateLevelOptions};
use sb_core::{SpellBlocksError, StepEvent};
use sb_runtime::{CancellationToken, NoPacing, Pacing, SleepPacing};
use tracing::debug;

use crate::{
    create_json_file, format_step_line, json_string, load_program_for_level,
    map_cli_report_write, outcome_exit_code, outcome_lines, write_json_to, CatalogArgs, RunArgs,
    WorldArgs,
};

pub(super) fn run_levels() -> Result<i32, SpellBlocksError> {
    println!("RESULT:OK");
    for level in list_levels() {
        println!("LEVEL:{}|{}", level.id, json_string(level.title));
    }
    Ok(0)
}

pub(super) fn run_catalog(args: CatalogArgs) -> Result<i32, SpellBlocksError> {
    let controller = create_level(CreateLevelOptions {
        level: args.level,
        ..CreateLevelOptions::default()
    })?;

    println!("RESULT:OK");
    for definition in controller.catalog().iter() {
        println!(
            "BLOCK:{}|{}|{}|{}",
            definition.id,
            definition.category,
            json_string(&definition.label),
            json_string(&definition.simulated_code)
        );
    }
    Ok(0)
}

pub(super) fn run_program(args: RunArgs) -> Result<i32, SpellBlocksError> {
    let blocks = match (args.blocks, args.program_file.as_deref()) {
        (Some(blocks), _) => blocks,
        (None, Some(path)) => load_program_for_level(Path::new(path), &args.level)?.blocks,
        (None, None) => Vec::new(),
    };
    debug!(level = args.level.as_str(), blocks = blocks.len(), "program loaded");

    let mut controller = create_level(level_options(
        args.level,
        Some(blocks),
        &args.world,
        (!args.paced).then_some(Duration::ZERO),
    ))?;

    let mut pacing: Box<dyn Pacing> = if args.paced {
        Box::new(SleepPacing::default())
    } else {
        Box::new(NoPacing)
    };
    let mut print_step = |event: &StepEvent| println!("{}", format_step_line(event));
    // Opened before RESULT:OK so a bad path is reported as the only result header.
    let report_file = args
        .report_out
        .as_deref()
        .map(|path| create_json_file(Path::new(path), map_cli_report_write))
        .transpose()?;

    println!("RESULT:OK");
    let report = controller.run(pacing.as_mut(), &CancellationToken::new(), &mut print_step)?;
    if let Some(file) = report_file {
        write_json_to(file, &report, map_cli_report_write)?;
    }
    for line in outcome_lines(&report) {
        println!("{}", line);
    }
    println!(
        "REPORT_OUT:{}",
        args.report_out.as_deref().unwrap_or("NONE")
    );
    Ok(outcome_exit_code(&report.outcome))
}

pub(crate) fn level_options(
    level: String,
    blocks: Option<Vec<String>>,
    world: &WorldArgs,
    step_delay: Option<Duration>,
) -> CreateLevelOptions {
    CreateLevelOptions {
        level,
        blocks,
        random_seed: world.seed,
        step_delay,
        weather: world.weather.clone(),
        monsters: world.monsters.clone(),
    }
}
