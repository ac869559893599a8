use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use sb_core::SpellBlocksError;

use crate::{
    map_cli_json, map_cli_program_invalid, map_cli_program_read, map_cli_program_write,
    ProgramFile, PROGRAM_FILE_SCHEMA,
};

pub(crate) fn save_program_file(path: &Path, program: &ProgramFile) -> Result<(), SpellBlocksError> {
    write_json_file(path, program, map_cli_program_write)
}

pub(crate) fn load_program_file(path: &Path) -> Result<ProgramFile, SpellBlocksError> {
    if !path.exists() {
        return Err(SpellBlocksError::new(
            "CLI_PROGRAM_NOT_FOUND",
            format!("Program file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_program_read)?;

    let program: ProgramFile = serde_json::from_str(&raw).map_err(map_cli_program_invalid)?;

    if program.schema_version != PROGRAM_FILE_SCHEMA {
        return Err(SpellBlocksError::new(
            "CLI_PROGRAM_SCHEMA",
            format!("Unsupported program file schema: {}", program.schema_version),
        ));
    }

    Ok(program)
}

/// Loads a program file and checks that it was saved for `level`.
pub(crate) fn load_program_for_level(
    path: &Path,
    level: &str,
) -> Result<ProgramFile, SpellBlocksError> {
    let program = load_program_file(path)?;
    if program.level != level {
        return Err(SpellBlocksError::new(
            "CLI_PROGRAM_LEVEL_MISMATCH",
            format!(
                "Program file is for level \"{}\", not \"{}\".",
                program.level, level
            ),
        ));
    }
    Ok(program)
}

/// Pretty-prints `value` to `path`, creating parent directories first.
pub(crate) fn write_json_file<T: serde::Serialize>(
    path: &Path,
    value: &T,
    map_io: fn(std::io::Error) -> SpellBlocksError,
) -> Result<(), SpellBlocksError> {
    let file = create_json_file(path, map_io)?;
    write_json_to(file, value, map_io)
}

/// Creates (or truncates) `path` and its parent directories.
pub(crate) fn create_json_file(
    path: &Path,
    map_io: fn(std::io::Error) -> SpellBlocksError,
) -> Result<File, SpellBlocksError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_io)?;
    File::create(path).map_err(map_io)
}

pub(crate) fn write_json_to<T: serde::Serialize>(
    mut file: File,
    value: &T,
    map_io: fn(std::io::Error) -> SpellBlocksError,
) -> Result<(), SpellBlocksError> {
    let payload = serde_json::to_string_pretty(value).map_err(map_cli_json)?;
    file.write_all(payload.as_bytes()).map_err(map_io)
}
