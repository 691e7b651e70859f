use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{BeToolError, TestCase, TESTCASE_SCHEMA_V1};

const CASE_SUFFIX: &str = ".case.json";

/// Every case file under `dir`, sorted by path.
pub fn collect_case_files(dir: &Path) -> Result<Vec<PathBuf>, BeToolError> {
    let mut cases = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(CASE_SUFFIX))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    if cases.is_empty() {
        return Err(BeToolError::SourceEmpty {
            path: dir.to_path_buf(),
        });
    }
    cases.sort();
    Ok(cases)
}

pub fn read_setup(path: &Path) -> Result<String, BeToolError> {
    fs::read_to_string(path).map_err(|source| BeToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, BeToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| BeToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| BeToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(BeToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
