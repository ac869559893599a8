#[cfg(coverage)]
pub(super) fn run_play_ratatui_mode(
    program_file: &str,
    controller: &mut sb_runtime::LevelController,
) -> Result<i32, sb_core::SpellBlocksError> {
    super::run_play_line_mode(program_file, controller)
}

#[cfg(not(coverage))]
mod rich {
    use std::io;
    use std::path::Path;
    use std::time::{Duration, Instant};

    use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use ratatui::backend::CrosstermBackend;
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Paragraph, Wrap};
    use ratatui::{Frame, Terminal};
    use sb_core::{InstanceId, SpellBlocksError, StepSeverity};
    use sb_runtime::{Advance, LevelController, ResetMode};

    use crate::{
        describe_outcome, describe_step, load_program_for_level, map_tui_io, render_track,
        save_program_file, ProgramFile,
    };

    const LIST_VIEWPORT_ROWS: usize = 8;
    const LOG_VIEWPORT_ROWS: usize = 6;
    const POLL_MS: u64 = 30;
    const ELLIPSIS: &str = "…";

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Focus {
        #[default]
        Catalog,
        Program,
    }

    #[derive(Debug, Default)]
    struct PlayUiState {
        focus: Focus,
        catalog_index: usize,
        program_index: usize,
        log: Vec<(StepSeverity, String)>,
        running: bool,
        next_step_at: Option<Instant>,
        active_instance: Option<InstanceId>,
        banner: Option<(bool, String)>,
        help_visible: bool,
        status: String,
    }

    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, SpellBlocksError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }

        fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
            &mut self.terminal
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(super) fn run_play_ratatui_mode(
        program_file: &str,
        controller: &mut LevelController,
    ) -> Result<i32, SpellBlocksError> {
        let mut terminal = TuiTerminal::new()?;
        let mut ui = PlayUiState {
            status: "ready".to_string(),
            ..PlayUiState::default()
        };

        loop {
            terminal
                .terminal_mut()
                .draw(|frame| render_play(frame, &ui, controller, program_file))
                .map_err(map_tui_io)?;

            if let Err(error) = ui.tick(controller) {
                ui.status = error.message;
            }

            if !event::poll(Duration::from_millis(POLL_MS)).map_err(map_tui_io)? {
                continue;
            }

            if let Event::Key(key) = event::read().map_err(map_tui_io)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = match handle_key(key, program_file, controller, &mut ui) {
                    Ok(should_quit) => should_quit,
                    Err(error) => {
                        ui.status = error.message;
                        false
                    }
                };
                if should_quit {
                    controller.abandon_run();
                    break;
                }
            }
        }

        Ok(0)
    }

    impl PlayUiState {
        fn start(&mut self, controller: &mut LevelController) -> Result<(), SpellBlocksError> {
            controller.start_run()?;
            self.log.clear();
            self.banner = None;
            self.running = true;
            self.next_step_at = Some(Instant::now());
            self.status = "running".to_string();
            Ok(())
        }

        /// Applies the next step once the level's step delay has passed.
        fn tick(&mut self, controller: &mut LevelController) -> Result<(), SpellBlocksError> {
            if !self.running {
                return Ok(());
            }
            let due = self.next_step_at.is_some_and(|at| Instant::now() >= at);
            if !due {
                return Ok(());
            }
            self.active_instance = controller.upcoming().map(|step| step.instance_id);
            match controller.advance()? {
                Advance::Step(event) => {
                    self.log.push((event.severity, describe_step(&event)));
                    self.next_step_at = Some(Instant::now() + controller.step_delay());
                }
                Advance::Finished(outcome) => {
                    self.running = false;
                    self.next_step_at = None;
                    self.active_instance = None;
                    self.banner = Some((outcome.is_success(), describe_outcome(&outcome)));
                    self.status = "finished".to_string();
                }
            }
            Ok(())
        }

        fn stop(&mut self, controller: &mut LevelController) {
            if let Some(outcome) = controller.abandon_run() {
                self.banner = Some((false, describe_outcome(&outcome)));
            }
            self.running = false;
            self.next_step_at = None;
            self.active_instance = None;
            self.status = "stopped".to_string();
        }

        fn clamp(&mut self, controller: &LevelController) {
            self.catalog_index = self
                .catalog_index
                .min(controller.catalog().len().saturating_sub(1));
            self.program_index = self
                .program_index
                .min(controller.program().len().saturating_sub(1));
        }
    }

    fn handle_key(
        key: crossterm::event::KeyEvent,
        program_file: &str,
        controller: &mut LevelController,
        ui: &mut PlayUiState,
    ) -> Result<bool, SpellBlocksError> {
        if key.code == KeyCode::Esc || matches!(key.code, KeyCode::Char('q')) {
            return Ok(true);
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match key.code {
            KeyCode::Char('h') => ui.help_visible = !ui.help_visible,
            KeyCode::Tab => {
                ui.focus = match ui.focus {
                    Focus::Catalog => Focus::Program,
                    Focus::Program => Focus::Catalog,
                };
            }
            KeyCode::Up => match ui.focus {
                Focus::Catalog => ui.catalog_index = ui.catalog_index.saturating_sub(1),
                Focus::Program => ui.program_index = ui.program_index.saturating_sub(1),
            },
            KeyCode::Down => {
                match ui.focus {
                    Focus::Catalog => ui.catalog_index += 1,
                    Focus::Program => ui.program_index += 1,
                }
                ui.clamp(controller);
            }
            KeyCode::Enter if ui.focus == Focus::Catalog => {
                let Some(block_id) = controller
                    .catalog()
                    .iter()
                    .nth(ui.catalog_index)
                    .map(|definition| definition.id.clone())
                else {
                    return Ok(false);
                };
                controller.append(&block_id)?;
                ui.program_index = controller.program().len().saturating_sub(1);
                ui.status = format!("added {}", block_id);
            }
            KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('d') => {
                let Some(instance_id) = controller
                    .program()
                    .list()
                    .get(ui.program_index)
                    .map(|instance| instance.instance_id)
                else {
                    ui.status = "program is empty".to_string();
                    return Ok(false);
                };
                controller.remove(instance_id)?;
                ui.clamp(controller);
                ui.status = "removed block".to_string();
            }
            KeyCode::Char('c') => {
                controller.clear_program()?;
                ui.clamp(controller);
                ui.status = "program cleared".to_string();
            }
            KeyCode::Char('r') => ui.start(controller)?,
            KeyCode::Char('x') => ui.stop(controller),
            KeyCode::Char('z') => {
                controller.reset(ResetMode::KeepProgram);
                ui.running = false;
                ui.banner = None;
                ui.log.clear();
                ui.status = "world reset".to_string();
            }
            KeyCode::Char('s') => {
                let program = ProgramFile::new(
                    controller.level().as_str(),
                    controller.program().block_ids(),
                );
                save_program_file(Path::new(program_file), &program)?;
                ui.status = format!("saved to {}", program_file);
            }
            KeyCode::Char('l') => {
                let program =
                    load_program_for_level(Path::new(program_file), controller.level().as_str())?;
                controller.load_program(&program.blocks)?;
                ui.clamp(controller);
                ui.status = format!("loaded from {}", program_file);
            }
            _ => {}
        }

        Ok(false)
    }

    fn truncate_to_width(value: &str, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let chars = value.chars().collect::<Vec<_>>();
        if chars.len() <= width {
            return value.to_string();
        }
        if width == 1 {
            return ELLIPSIS.to_string();
        }
        let mut out = chars.into_iter().take(width - 1).collect::<String>();
        out.push_str(ELLIPSIS);
        out
    }

    /// Rows `[start, start + rows)` that keep `selected` visible.
    fn window_start(selected: usize, total: usize, rows: usize) -> usize {
        if total <= rows {
            return 0;
        }
        selected.saturating_sub(rows - 1).min(total - rows)
    }

    fn render_play(
        frame: &mut Frame<'_>,
        ui: &PlayUiState,
        controller: &LevelController,
        program_file: &str,
    ) {
        let content_width = (frame.area().width as usize).saturating_sub(2).max(16);
        let gray = Style::default().fg(Color::Gray);
        let heading = |text: &str, focused: bool| {
            let style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            Line::from(Span::styled(truncate_to_width(text, content_width), style))
        };

        let mut lines_out: Vec<Line<'_>> = Vec::new();
        lines_out.push(Line::from(truncate_to_width(
            format!(
                "{} | {} | seed {}",
                controller.level(),
                controller.title(),
                controller.options().seed()
            )
            .as_str(),
            content_width,
        )));
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(format!("program file: {}", program_file).as_str(), content_width),
            gray,
        )));
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(format!("status: {}", ui.status).as_str(), content_width),
            gray,
        )));

        lines_out.push(Line::from(truncate_to_width(
            format!("track: {}", render_track(controller.world())).as_str(),
            content_width,
        )));
        let variables = controller
            .variables()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(format!("variables: {}", variables).as_str(), content_width),
            gray,
        )));

        let catalog = controller.catalog().iter().collect::<Vec<_>>();
        lines_out.push(heading("blocks", ui.focus == Focus::Catalog));
        let start = window_start(ui.catalog_index, catalog.len(), LIST_VIEWPORT_ROWS);
        for (index, definition) in catalog
            .iter()
            .enumerate()
            .skip(start)
            .take(LIST_VIEWPORT_ROWS)
        {
            let selected = ui.focus == Focus::Catalog && index == ui.catalog_index;
            let text = format!(
                "{}{:<9} {}",
                if selected { "> " } else { "  " },
                definition.category,
                definition.label
            );
            let style = if selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            lines_out.push(Line::from(Span::styled(
                truncate_to_width(&text, content_width),
                style,
            )));
        }

        let program = controller.program().list();
        lines_out.push(heading("program", ui.focus == Focus::Program));
        if program.is_empty() {
            lines_out.push(Line::from(Span::styled("  (empty)".to_string(), gray)));
        }
        let start = window_start(ui.program_index, program.len(), LIST_VIEWPORT_ROWS);
        for (index, instance) in program
            .iter()
            .enumerate()
            .skip(start)
            .take(LIST_VIEWPORT_ROWS)
        {
            let selected = ui.focus == Focus::Program && index == ui.program_index;
            let active = ui.active_instance == Some(instance.instance_id);
            let text = format!(
                "{}{:>2}. {:<26} {}",
                if active { "* " } else if selected { "> " } else { "  " },
                index + 1,
                instance.definition.label,
                instance.definition.simulated_code
            );
            let style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            lines_out.push(Line::from(Span::styled(
                truncate_to_width(&text, content_width),
                style,
            )));
        }

        lines_out.push(Line::from(Span::styled("─".repeat(content_width), gray)));
        let skip = ui.log.len().saturating_sub(LOG_VIEWPORT_ROWS);
        for (severity, text) in ui.log.iter().skip(skip) {
            let style = match severity {
                StepSeverity::Info => Style::default(),
                StepSeverity::Warning => Style::default().fg(Color::Yellow),
                StepSeverity::Failure => Style::default().fg(Color::Red),
            };
            lines_out.push(Line::from(Span::styled(
                truncate_to_width(text, content_width),
                style,
            )));
        }
        if let Some((success, text)) = &ui.banner {
            let color = if *success { Color::Green } else { Color::Red };
            lines_out.push(Line::from(Span::styled(
                truncate_to_width(text, content_width),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }

        lines_out.push(Line::from(Span::styled(
            truncate_to_width(
                "keys: tab focus | up/down move | enter add | d remove | c clear | r run | x stop | z reset | s save | l load | h help | q quit",
                content_width,
            ),
            Style::default().fg(Color::Yellow),
        )));
        if ui.help_visible {
            lines_out.push(Line::from(Span::styled(
                truncate_to_width(
                    "the program cannot change while it runs. press x to stop a run early.",
                    content_width,
                ),
                Style::default().fg(Color::Magenta),
            )));
        }

        let paragraph = Paragraph::new(lines_out).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, frame.area());
    }

}

#[cfg(not(coverage))]
pub(super) fn run_play_ratatui_mode(
    program_file: &str,
    controller: &mut sb_runtime::LevelController,
) -> Result<i32, sb_core::SpellBlocksError> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return super::run_play_line_mode(program_file, controller);
    }
    rich::run_play_ratatui_mode(program_file, controller)
}
