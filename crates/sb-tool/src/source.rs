use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{SbToolError, TestCase, TESTCASE_SCHEMA_V1};

/// Every `.json` file under `cases_dir`, sorted by path.
pub fn read_cases_from_dir(cases_dir: &Path) -> Result<Vec<PathBuf>, SbToolError> {
    let mut cases = Vec::new();

    for entry in WalkDir::new(cases_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|source| SbToolError::ScanDir {
            path: cases_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            cases.push(entry.into_path());
        }
    }

    if cases.is_empty() {
        return Err(SbToolError::CasesEmpty {
            path: cases_dir.to_path_buf(),
        });
    }

    Ok(cases)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, SbToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| SbToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| SbToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(SbToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
