use std::path::PathBuf;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos")
}

pub fn cases_dir() -> PathBuf {
    demos_root().join("cases")
}

pub fn case_path(name: &str) -> PathBuf {
    cases_dir().join(format!("{}.json", name))
}
