//! Directory-resilient rule loading and global config parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rex_core::{GlobalConfig, Rule};
use tracing::{debug, warn};

use crate::error::RuleError;
use crate::raw::RawRule;
use crate::validate::validate_rule;

/// Result of loading a rules directory: the valid rules, keyed by name
/// with last-writer-wins applied, alongside every per-document error.
#[derive(Debug, Default)]
pub struct RuleLoadResult {
    pub rules: Vec<Rule>,
    pub errors: Vec<(PathBuf, RuleError)>,
}

/// Load every `.yaml`/`.yml` document directly under `dir` (subdirectories
/// and other extensions are skipped), validating each against `global`.
///
/// A single invalid document never aborts the batch: valid documents are
/// returned and every failure is collected alongside the path that
/// produced it.
pub fn load_rules_dir(dir: &Path, global: &GlobalConfig) -> Result<RuleLoadResult, RuleError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml")))
        .collect();
    paths.sort();

    let mut by_name: HashMap<String, Rule> = HashMap::new();
    let mut errors = Vec::new();

    for path in paths {
        match load_one(&path, global) {
            Ok(rule) => {
                if let Some(previous) = by_name.insert(rule.name.clone(), rule) {
                    warn!(
                        rule_name = %previous.name,
                        path = %path.display(),
                        "duplicate rule name loaded, last writer wins"
                    );
                }
            }
            Err(e) => errors.push((path, e)),
        }
    }

    let rules: Vec<Rule> = by_name.into_values().collect();
    warn_on_dependency_overlaps(&rules);

    Ok(RuleLoadResult { rules, errors })
}

fn load_one(path: &Path, global: &GlobalConfig) -> Result<Rule, RuleError> {
    let contents = std::fs::read_to_string(path)?;
    let raw: RawRule = serde_yaml::from_str(&contents)?;
    validate_rule(raw, global)
}

/// `depends_on_rules` overlapping another rule's `triggers_rules` is a
/// warning only, never a load failure.
fn warn_on_dependency_overlaps(rules: &[Rule]) {
    for rule in rules {
        for dep in &rule.depends_on_rules {
            for other in rules {
                if other.triggers_rules.iter().any(|t| t == dep) {
                    debug!(
                        rule = %rule.name,
                        dependency = %dep,
                        chainer = %other.name,
                        "depends_on_rules overlaps with another rule's triggers_rules"
                    );
                }
            }
        }
    }
}

/// Parse the global daemon configuration document.
pub fn load_global_config(path: &Path) -> Result<GlobalConfig, RuleError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// The rules directory must not be world-writable, and must be no more
/// permissive than `0750`.
#[cfg(unix)]
pub fn validate_directory_permissions(dir: &Path) -> Result<(), RuleError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(dir)?.permissions().mode() & 0o777;
    let world_writable = mode & 0o002 != 0;
    let overly_permissive = mode & !0o750 != 0;

    if world_writable || overly_permissive {
        return Err(RuleError::UnsafeDirectoryPermissions(dir.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn validate_directory_permissions(_dir: &Path) -> Result<(), RuleError> {
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
