use std::path::Path;

use sb_api::{run_program, RunProgramOptions};
use sb_core::RunReport;

use crate::source::read_test_case;
use crate::{SbToolError, TestCase};

pub fn run_case(case: &TestCase) -> Result<RunReport, SbToolError> {
    let report = run_program(RunProgramOptions {
        level: case.level.clone(),
        blocks: case.blocks.clone(),
        random_seed: case.seed,
        weather: case.weather.clone(),
        monsters: case.monsters.clone(),
    })?;
    Ok(report)
}

/// Compares a finished run with everything the case expects.
pub fn check_report(case: &TestCase, report: &RunReport) -> Result<(), SbToolError> {
    if !case.expected.matches(&report.outcome) {
        return Err(SbToolError::OutcomeMismatch {
            expected: serde_json::to_string(&case.expected)
                .map_err(SbToolError::OutcomeSerialize)?,
            actual: serde_json::to_string(&report.outcome)
                .map_err(SbToolError::OutcomeSerialize)?,
        });
    }

    if let Some(expected) = case.expected_steps {
        if expected != report.events.len() {
            return Err(SbToolError::StepCountMismatch {
                expected,
                actual: report.events.len(),
            });
        }
    }

    if let Some(expected) = case.expected_final_position {
        if expected != report.final_world.position {
            return Err(SbToolError::FinalPositionMismatch {
                expected,
                actual: report.final_world.position,
            });
        }
    }

    for (name, expected) in &case.expected_variables {
        let actual = report.final_variables.get(name);
        if actual != Some(expected) {
            return Err(SbToolError::VariableMismatch {
                name: name.clone(),
                expected: expected.to_string(),
                actual: actual
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "(unset)".to_string()),
            });
        }
    }

    let mut messages = report
        .events
        .iter()
        .map(|event| event.message.as_str())
        .chain(std::iter::once(report.outcome.message()));
    for expected in &case.expected_messages {
        if !messages.any(|message| message.contains(expected.as_str())) {
            return Err(SbToolError::MessageMissing {
                message: expected.clone(),
                observed: report
                    .events
                    .iter()
                    .map(|event| event.message.as_str())
                    .chain(std::iter::once(report.outcome.message()))
                    .collect::<Vec<_>>()
                    .join(" | "),
            });
        }
    }

    Ok(())
}

pub fn assert_case(case_path: &Path) -> Result<(), SbToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(&case)?;
    check_report(&case, &report)
}
