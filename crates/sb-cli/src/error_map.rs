use sb_core::SpellBlocksError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> SpellBlocksError {
    SpellBlocksError::new(code, error.to_string())
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_error(error: SpellBlocksError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> SpellBlocksError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_program_write(error: std::io::Error) -> SpellBlocksError {
    map_error("CLI_PROGRAM_WRITE", error)
}

pub(crate) fn map_cli_program_read(error: std::io::Error) -> SpellBlocksError {
    map_error("CLI_PROGRAM_READ", error)
}

pub(crate) fn map_cli_program_invalid(error: serde_json::Error) -> SpellBlocksError {
    map_error("CLI_PROGRAM_INVALID", error)
}

pub(crate) fn map_cli_report_write(error: std::io::Error) -> SpellBlocksError {
    map_error("CLI_REPORT_WRITE", error)
}

pub(crate) fn map_cli_json(error: serde_json::Error) -> SpellBlocksError {
    map_error("CLI_JSON", error)
}
