//! Gemini CLI subprocess client.
//!
//! The prompt goes through stdin rather than argv, which keeps large
//! prompts clear of command-line length limits.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{non_empty_env, ModelClient, TransportError};
use crate::config::ModelConfig;

/// Locate the Gemini CLI.
///
/// Order: `GEMINI_BIN`, `gemini` on PATH, `gemini.cmd` on Windows, then
/// `npx -y @google/gemini-cli`.
pub fn resolve_gemini_bin() -> Result<Vec<String>, TransportError> {
    if let Some(bin) = non_empty_env("GEMINI_BIN") {
        if PathBuf::from(&bin).exists() {
            return Ok(vec![bin]);
        }
        warn!(path = %bin, "GEMINI_BIN does not exist, searching PATH");
    }

    if let Ok(found) = which::which("gemini") {
        return Ok(vec![found.to_string_lossy().to_string()]);
    }

    if cfg!(windows) {
        if let Ok(found) = which::which("gemini.cmd") {
            return Ok(vec![found.to_string_lossy().to_string()]);
        }
    }

    if let Ok(npx) = which::which("npx") {
        return Ok(vec![
            npx.to_string_lossy().to_string(),
            "-y".to_string(),
            "@google/gemini-cli".to_string(),
        ]);
    }

    Err(TransportError::BinaryNotFound)
}

/// Runs `<bin> [--include-directories a,b] -m <model>` per prompt.
pub struct GeminiCliClient {
    command: Vec<String>,
    model: String,
    label: String,
    include_directories: Vec<String>,
    timeout: Duration,
}

impl GeminiCliClient {
    /// Resolve the CLI binary and build a client.
    pub fn from_config(config: &ModelConfig) -> Result<Self, TransportError> {
        Ok(Self::with_command(resolve_gemini_bin()?, config))
    }

    /// Build a client around an explicit command (program plus leading args).
    pub fn with_command(command: Vec<String>, config: &ModelConfig) -> Self {
        Self {
            command,
            model: config.name.trim().to_string(),
            label: format!("{} (cli)", config.name.trim()),
            include_directories: config.include_directories.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the process timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        if !self.include_directories.is_empty() {
            args.push("--include-directories".to_string());
            args.push(self.include_directories.join(","));
        }
        args.push("-m".to_string());
        args.push(self.model.clone());
        args
    }

    async fn run(&self, prompt: &str) -> Result<String, TransportError> {
        let program = self.command.first().ok_or(TransportError::BinaryNotFound)?;
        debug!(program = %program, args = ?self.args(), "spawning model CLI");

        let mut child = Command::new(program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let input = prompt.as_bytes().to_vec();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&input).await {
                    // The process may exit without reading; its status says why.
                    debug!(error = %e, "writing prompt to stdin failed");
                }
            }
        };

        let (_, output) = tokio::time::timeout(self.timeout, async move {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .map_err(|_| TransportError::Timeout(self.timeout))?;
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TransportError::Process {
                code: output.status.code(),
                stderr: if stderr.is_empty() {
                    "Gemini CLI error".to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ModelClient for GeminiCliClient {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.run(prompt))
    }
}
