use sb_core::{EntityKind, Outcome, RunReport, StepEvent, StepSeverity, WorldState};

use crate::json_string;

/// `STEP:<index>|<round or ->|<severity>|<message json>`
pub(crate) fn format_step_line(event: &StepEvent) -> String {
    format!(
        "STEP:{}|{}|{}|{}",
        event.index,
        event
            .iteration
            .map(|round| round.to_string())
            .unwrap_or_else(|| "-".to_string()),
        event.severity.as_str(),
        json_string(&event.message)
    )
}

pub(crate) fn outcome_lines(report: &RunReport) -> Vec<String> {
    let status = if report.outcome.is_success() {
        "SUCCESS"
    } else {
        "FAILURE"
    };
    vec![
        format!("OUTCOME:{}", status),
        format!(
            "FAILURE_KIND:{}",
            report
                .outcome
                .failure_kind()
                .map(|kind| kind.as_str())
                .unwrap_or("NONE")
        ),
        format!("MESSAGE_JSON:{}", json_string(report.outcome.message())),
        format!("FINAL_POSITION:{}", report.final_world.position),
    ]
}

pub(crate) fn outcome_exit_code(outcome: &Outcome) -> i32 {
    if outcome.is_success() {
        0
    } else {
        2
    }
}

/// One log line for people, used by the interactive modes.
pub(crate) fn describe_step(event: &StepEvent) -> String {
    let marker = match event.severity {
        StepSeverity::Info => " ",
        StepSeverity::Warning => "!",
        StepSeverity::Failure => "x",
    };
    let round = event
        .iteration
        .map(|round| format!(" (round {})", round))
        .unwrap_or_default();
    format!(
        "{} {:>2}. {}{}: {}",
        marker,
        event.index + 1,
        event.label,
        round,
        event.message
    )
}

pub(crate) fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { message } => format!("SUCCESS: {}", message),
        Outcome::Failure { kind, reason } => format!("FAILURE ({}): {}", kind, reason),
        Outcome::StillRunning => "running...".to_string(),
    }
}

/// The track as one row of squares. `W` marks the wizard.
pub(crate) fn render_track(world: &WorldState) -> String {
    (0..world.track_length)
        .map(|square| {
            if square == world.position {
                return "W".to_string();
            }
            world
                .entities
                .iter()
                .find(|entity| entity.position == square)
                .map(|entity| entity_glyph(entity.kind, entity.resolved))
                .unwrap_or_else(|| ".".to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn entity_glyph(kind: EntityKind, resolved: bool) -> String {
    match (kind, resolved) {
        (EntityKind::BrokenPlank, false) => "_".to_string(),
        (EntityKind::BrokenPlank, true) => "=".to_string(),
        (_, true) => "*".to_string(),
        (kind, false) => kind.as_str()[..1].to_string(),
    }
}
