use serde::{Deserialize, Serialize};

pub(crate) const PROGRAM_FILE_SCHEMA: &str = "program.v1";
pub(crate) const DEFAULT_PROGRAM_FILE: &str = ".spellblocks/program.json";

/// A saved block sequence for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgramFile {
    pub(crate) schema_version: String,
    pub(crate) level: String,
    pub(crate) blocks: Vec<String>,
}

impl ProgramFile {
    pub(crate) fn new(level: &str, blocks: Vec<String>) -> Self {
        Self {
            schema_version: PROGRAM_FILE_SCHEMA.to_string(),
            level: level.to_string(),
            blocks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayCommandAction {
    NotHandled,
    Continue,
    Quit,
}

pub(crate) struct PlayCommandContext<'a> {
    pub(crate) program_file: &'a str,
}
