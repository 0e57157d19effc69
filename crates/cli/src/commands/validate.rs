use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use rex_core::GlobalConfig;

#[derive(Args)]
pub struct ValidateArgs {
    /// Directory of `.yaml`/`.yml` rule documents to validate.
    pub rules_dir: PathBuf,
}

/// Loads and validates a rules directory without starting any trigger,
/// printing per-document errors; exits non-zero if any document is
/// invalid.
pub fn handle(args: ValidateArgs) -> Result<()> {
    rex_rules::validate_directory_permissions(&args.rules_dir)?;

    let result = rex_rules::load_rules_dir(&args.rules_dir, &GlobalConfig::default())?;

    for rule in &result.rules {
        println!("ok: {}", rule.name);
    }
    for (path, err) in &result.errors {
        println!("invalid: {}: {err}", path.display());
    }

    println!("\n{} valid, {} invalid", result.rules.len(), result.errors.len());

    if !result.errors.is_empty() {
        bail!("{} rule document(s) failed validation", result.errors.len());
    }
    Ok(())
}
