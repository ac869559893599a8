use std::io::{self, BufRead, Write};
use std::path::Path;

use sb_core::{SpellBlocksError, StepEvent};
use sb_runtime::{CancellationToken, LevelController, ResetMode, SleepPacing};

use crate::{
    describe_outcome, describe_step, load_program_for_level, map_tui_io, render_track,
    save_program_file, PlayCommandAction, PlayCommandContext, ProgramFile,
};

const HELP_TEXT: &str =
    "commands: :help :catalog :list :add <block>... :remove <n> :clear :run :reset :seed <n> :save :load :quit";

pub(crate) fn run_play_line_mode(
    program_file: &str,
    controller: &mut LevelController,
) -> Result<i32, SpellBlocksError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(program_file, controller, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    program_file: &str,
    controller: &mut LevelController,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, SpellBlocksError> {
    let context = PlayCommandContext { program_file };
    let mut lines = Vec::new();
    {
        let mut emit = |line: String| lines.push(line);
        emit(format!(
            "SpellBlocks: {} ({})",
            controller.title(),
            controller.level()
        ));
        emit(HELP_TEXT.to_string());
    }
    flush_lines(writer, &mut lines)?;

    loop {
        let Some(raw) = prompt_input_from("> ", reader, writer)? else {
            return Ok(0);
        };
        let action = {
            let mut emit = |line: String| lines.push(line);
            match handle_play_command(raw.trim(), &context, controller, &mut emit) {
                Ok(action) => action,
                Err(error) => {
                    emit(format!("error: {}", error));
                    PlayCommandAction::Continue
                }
            }
        };
        flush_lines(writer, &mut lines)?;
        if action == PlayCommandAction::Quit {
            return Ok(0);
        }
    }
}

fn flush_lines(writer: &mut dyn Write, lines: &mut Vec<String>) -> Result<(), SpellBlocksError> {
    for line in lines.drain(..) {
        writeln!(writer, "{}", line).map_err(map_tui_io)?;
    }
    writer.flush().map_err(map_tui_io)
}

/// Handles one workshop command. Bare block ids are appended.
pub(crate) fn handle_play_command(
    raw: &str,
    context: &PlayCommandContext<'_>,
    controller: &mut LevelController,
    emit: &mut dyn FnMut(String),
) -> Result<PlayCommandAction, SpellBlocksError> {
    let mut parts = raw.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(PlayCommandAction::NotHandled);
    };
    let args = parts.collect::<Vec<_>>();

    match command {
        ":help" => emit(HELP_TEXT.to_string()),
        ":catalog" => {
            for definition in controller.catalog().iter() {
                emit(format!(
                    "  {:<28} {:<10} {}",
                    definition.id, definition.category, definition.label
                ));
            }
        }
        ":list" => emit_program(controller, emit),
        ":add" => {
            if args.is_empty() {
                return Err(usage(":add <block> [<block>...]"));
            }
            for block_id in args {
                controller.append(block_id)?;
            }
            emit_program(controller, emit);
        }
        ":remove" => {
            let position = args
                .first()
                .and_then(|raw| raw.parse::<usize>().ok())
                .filter(|position| *position >= 1)
                .ok_or_else(|| usage(":remove <n>"))?;
            let instance_id = controller
                .program()
                .list()
                .get(position - 1)
                .map(|instance| instance.instance_id)
                .ok_or_else(|| {
                    SpellBlocksError::new(
                        "TUI_BLOCK_INDEX",
                        format!(
                            "There is no block {} in a program of {} blocks.",
                            position,
                            controller.program().len()
                        ),
                    )
                })?;
            controller.remove(instance_id)?;
            emit_program(controller, emit);
        }
        ":clear" => {
            controller.clear_program()?;
            emit("program cleared".to_string());
        }
        ":run" => {
            let mut print_step = |event: &StepEvent| emit(describe_step(event));
            let report = controller.run(
                &mut SleepPacing::default(),
                &CancellationToken::new(),
                &mut print_step,
            )?;
            emit(format!("track: {}", render_track(&report.final_world)));
            emit(describe_outcome(&report.outcome));
        }
        ":reset" => {
            controller.reset(ResetMode::KeepProgram);
            emit(format!("track: {}", render_track(controller.world())));
        }
        ":seed" => {
            let seed = args
                .first()
                .and_then(|raw| raw.parse::<u32>().ok())
                .ok_or_else(|| usage(":seed <n>"))?;
            controller.reseed(seed)?;
            emit(format!("seed: {}", seed));
            emit(format!("track: {}", render_track(controller.world())));
        }
        ":save" => {
            let program =
                ProgramFile::new(controller.level().as_str(), controller.program().block_ids());
            save_program_file(Path::new(context.program_file), &program)?;
            emit(format!("saved: {}", context.program_file));
        }
        ":load" => {
            let program = load_program_for_level(
                Path::new(context.program_file),
                controller.level().as_str(),
            )?;
            controller.load_program(&program.blocks)?;
            emit(format!("loaded: {}", context.program_file));
            emit_program(controller, emit);
        }
        ":quit" => {
            emit("bye".to_string());
            return Ok(PlayCommandAction::Quit);
        }
        other if other.starts_with(':') => {
            return Err(SpellBlocksError::new(
                "TUI_COMMAND_UNKNOWN",
                format!("Unknown command {}. Type :help for the list.", other),
            ));
        }
        _ => {
            for block_id in raw.split_whitespace() {
                controller.append(block_id)?;
            }
            emit_program(controller, emit);
        }
    }
    Ok(PlayCommandAction::Continue)
}

fn emit_program(controller: &LevelController, emit: &mut dyn FnMut(String)) {
    if controller.program().is_empty() {
        emit("program: (empty)".to_string());
        return;
    }
    emit("program:".to_string());
    for (index, instance) in controller.program().list().iter().enumerate() {
        emit(format!(
            "  {:>2}. {:<28} {}",
            index + 1,
            instance.definition.label,
            instance.definition.simulated_code
        ));
    }
}

fn usage(text: &str) -> SpellBlocksError {
    SpellBlocksError::new("TUI_COMMAND_USAGE", format!("usage: {}", text))
}

/// Reads one line. `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, SpellBlocksError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_tui_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
