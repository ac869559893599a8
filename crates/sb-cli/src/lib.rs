use std::ffi::OsString;

use clap::Parser;
use sb_api::create_level;
use sb_core::SpellBlocksError;
use tracing_subscriber::EnvFilter;

mod agent;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod run_report;
mod state_store;
mod tui;

pub(crate) use agent::level_options;
pub(crate) use cli_args::{CatalogArgs, Cli, Mode, PlayArgs, RunArgs, WorldArgs};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_json, map_cli_program_invalid, map_cli_program_read,
    map_cli_program_write, map_cli_report_write, map_tui_io,
};
pub(crate) use line_tui::run_play_line_mode;
#[cfg(test)]
pub(crate) use line_tui::{handle_play_command, prompt_input_from, run_play_line_mode_with_io};
pub(crate) use models::{
    PlayCommandAction, PlayCommandContext, ProgramFile, DEFAULT_PROGRAM_FILE, PROGRAM_FILE_SCHEMA,
};
pub(crate) use run_report::{
    describe_outcome, describe_step, format_step_line, outcome_exit_code, outcome_lines,
    render_track,
};
#[cfg(test)]
pub(crate) use state_store::load_program_file;
pub(crate) use state_store::{
    create_json_file, load_program_for_level, save_program_file, write_json_to,
};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr so the stdout line protocol stays clean. `RUST_LOG` overrides `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, SpellBlocksError> {
    match cli.command {
        Mode::Levels => agent::run_levels(),
        Mode::Catalog(args) => agent::run_catalog(args),
        Mode::Run(args) => agent::run_program(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, SpellBlocksError> {
    let program_file = args
        .program_file
        .unwrap_or_else(|| DEFAULT_PROGRAM_FILE.to_string());
    let mut controller = create_level(level_options(args.level, None, &args.world, None))?;

    tui::run_play_ratatui_mode(&program_file, &mut controller)
}
