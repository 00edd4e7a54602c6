//! Legacy Device Lists
//!
//! Older playbooks list explicit device paths instead of declarative
//! requirements. Each path becomes a one-slot declaration constrained on
//! `path` alone, so it goes through the same expansion and matching.

use crate::domain::model::{RequirementDeclaration, RequirementSet, Role, PATH_ATTRIBUTE};

/// Declarations `<role>_<index>` matching each listed path
pub fn legacy_declarations(paths: &[String], role: Role) -> RequirementSet {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let declaration =
                RequirementDeclaration::new().constrain(PATH_ATTRIBUTE, clean_path(path));
            (format!("{}_{}", role, index), declaration)
        })
        .collect()
}

/// Drop a trailing separator so `/dev/sdb/` matches `/dev/sdb`
fn clean_path(path: &str) -> String {
    let trimmed = path.trim();
    match trimmed.trim_end_matches('/') {
        "" => trimmed.to_string(),
        cleaned => cleaned.to_string(),
    }
}
