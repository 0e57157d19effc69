//! Synthesises a throwaway MCP-config file that wires the memory server into
//! an agent invocation, and removes it once the subprocess has exited.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ExecutorError;

/// A temporary MCP-config file on disk. Deleted (best-effort) on drop.
pub struct MemoryMcpConfig {
    path: PathBuf,
}

impl MemoryMcpConfig {
    /// Writes a single-server MCP config pointing at the daemon binary's
    /// own `mcp-memory` subcommand, rooted at `memory_path`.
    pub fn write(daemon_exe: &Path, memory_path: &str) -> Result<Self, ExecutorError> {
        let doc = serde_json::json!({
            "mcpServers": {
                "rex-memory": {
                    "command": daemon_exe.to_string_lossy(),
                    "args": ["mcp-memory", "--path", memory_path],
                }
            }
        });

        let mut file = tempfile::Builder::new()
            .prefix("rex-mem-")
            .suffix(".json")
            .tempfile()
            .map_err(ExecutorError::McpConfigWrite)?;
        file.write_all(serde_json::to_string_pretty(&doc).unwrap_or_default().as_bytes())
            .map_err(ExecutorError::McpConfigWrite)?;
        let (_, path) = file.keep().map_err(|e| ExecutorError::McpConfigWrite(e.error))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MemoryMcpConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "mcp_temp_tests.rs"]
mod tests;
