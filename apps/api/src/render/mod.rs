//! LaTeX → PDF compilation through an external `pdflatex` process.
//!
//! Every compile runs inside its own temporary directory. The directory guard
//! is dropped on every exit path, so nothing outlives the call.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;

const TEX_FILE: &str = "resume.tex";
const PDF_FILE: &str = "resume.pdf";
/// How much of the compiler log is kept when no PDF comes out.
const LOG_TAIL_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("PDF compilation timed out after {0:?}")]
    Timeout(Duration),

    #[error("LaTeX compiler '{0}' is not installed. Install a TeX distribution (e.g. TeX Live or MiKTeX) and make sure pdflatex is on PATH")]
    NotInstalled(String),

    #[error("PDF compilation failed. Compiler output: {log_tail}")]
    NoOutput { log_tail: String },

    #[error("PDF compilation error: {0}")]
    Other(String),
}

/// Runs the configured LaTeX compiler non-interactively.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
    pre_args: Vec<String>,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl LatexCompiler {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            pre_args: Vec::new(),
            timeout,
            scratch_root: None,
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::new(config.program.clone(), config.timeout).with_pre_args(config.args.clone())
    }

    /// Arguments placed before the standard ones, for wrapper programs.
    pub fn with_pre_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pre_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Creates workspaces under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn compile(&self, latex_source: &str) -> Result<Vec<u8>, CompileError> {
        let workspace = self.workspace()?;
        let result = self.compile_in(workspace.path(), latex_source).await;
        if let Err(e) = workspace.close() {
            warn!("Failed to remove compile workspace: {e}");
        }
        result
    }

    fn workspace(&self) -> Result<TempDir, CompileError> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("resume-build-");
            b
        };
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| CompileError::Other(format!("could not create workspace: {e}")))
    }

    async fn compile_in(&self, dir: &Path, latex_source: &str) -> Result<Vec<u8>, CompileError> {
        let tex_path = dir.join(TEX_FILE);
        tokio::fs::write(&tex_path, latex_source)
            .await
            .map_err(|e| CompileError::Other(format!("could not write {TEX_FILE}: {e}")))?;

        // The source is model output shaped by request text: no shell escape,
        // and kpathsea may only open files under the workspace.
        let mut command = Command::new(&self.program);
        command
            .args(&self.pre_args)
            .arg("-no-shell-escape")
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(dir)
            .arg(&tex_path)
            .current_dir(dir)
            .env("openin_any", "p")
            .env("openout_any", "p")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {} in {}", self.program, dir.display());

        let child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => CompileError::NotInstalled(self.program.clone()),
            _ => CompileError::Other(e.to_string()),
        })?;

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| CompileError::Other(e.to_string()))?,
            Err(_) => {
                warn!("{} exceeded {:?}", self.program, self.timeout);
                return Err(CompileError::Timeout(self.timeout));
            }
        };

        let pdf_path = dir.join(PDF_FILE);
        if !pdf_path.exists() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(CompileError::NoOutput {
                log_tail: tail_chars(&stdout, LOG_TAIL_CHARS).to_string(),
            });
        }

        let pdf = tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| CompileError::Other(format!("could not read {PDF_FILE}: {e}")))?;
        info!("Compiled PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

/// Last `n` characters of `text`, on a char boundary.
fn tail_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    let start = text
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &text[start..]
}
