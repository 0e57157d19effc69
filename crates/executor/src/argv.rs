//! Deterministic argv construction from a merged [`AgentConfig`].

use std::path::Path;

use rex_core::AgentConfig;

use crate::error::ExecutorError;

/// Builds the final argv for the agent invocation. Ordering is fixed:
/// `--print` first, optional debug flags, then the nine agent-config
/// fields in the order the component design specifies, the synthesised
/// memory MCP config (if any) immediately before the prompt, and finally
/// the rendered prompt as the last positional argument.
///
/// Enforces `max_actions` as a hard cap on the number of flag entries this
/// function is willing to append (`--add-dir`, `--mcp-config`, and the two
/// tool-list flags each count as one entry) rather than silently
/// truncating the invocation.
pub fn build_argv(
    config: &AgentConfig,
    prompt: &str,
    debug: bool,
    max_actions: u32,
    memory_mcp_config: Option<&Path>,
) -> Result<Vec<String>, ExecutorError> {
    let mut argv = vec!["--print".to_string()];
    if debug {
        argv.push("--verbose".to_string());
        argv.push("--output-format".to_string());
        argv.push("stream-json".to_string());
    }

    let mut entries = 0u32;

    if let Some(model) = &config.model {
        argv.push("--model".to_string());
        argv.push(model.clone());
    }
    if !config.allowed_tools.is_empty() {
        count_entry(&mut entries, max_actions)?;
        argv.push("--allowedTools".to_string());
        argv.push(config.allowed_tools.join(","));
    }
    if !config.disallowed_tools.is_empty() {
        count_entry(&mut entries, max_actions)?;
        argv.push("--disallowedTools".to_string());
        argv.push(config.disallowed_tools.join(","));
    }
    for dir in &config.add_dirs {
        count_entry(&mut entries, max_actions)?;
        argv.push("--add-dir".to_string());
        argv.push(dir.clone());
    }
    if let Some(mode) = &config.permission_mode {
        argv.push("--permission-mode".to_string());
        argv.push(mode.clone());
    }
    if let Some(budget) = config.max_budget_usd {
        if budget != 0.0 {
            argv.push("--max-budget-usd".to_string());
            argv.push(format!("{budget:.2}"));
        }
    }
    if let Some(sp) = &config.system_prompt {
        argv.push("--system-prompt".to_string());
        argv.push(sp.clone());
    }
    if let Some(asp) = &config.append_system_prompt {
        argv.push("--append-system-prompt".to_string());
        argv.push(asp.clone());
    }
    for mcp in &config.mcp_config {
        count_entry(&mut entries, max_actions)?;
        argv.push("--mcp-config".to_string());
        argv.push(mcp.clone());
    }
    if let Some(temp_path) = memory_mcp_config {
        count_entry(&mut entries, max_actions)?;
        argv.push("--mcp-config".to_string());
        argv.push(temp_path.to_string_lossy().into_owned());
    }

    argv.push(prompt.to_string());
    Ok(argv)
}

fn count_entry(entries: &mut u32, max_actions: u32) -> Result<(), ExecutorError> {
    *entries += 1;
    if *entries > max_actions {
        return Err(ExecutorError::MaxActionsExceeded(*entries, max_actions));
    }
    Ok(())
}

#[cfg(test)]
#[path = "argv_tests.rs"]
mod tests;
