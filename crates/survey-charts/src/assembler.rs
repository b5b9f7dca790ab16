//! Presentation assembly through an external builder script

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use survey_common::{ReportError, Result};
use survey_config::AssemblerConfig;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Script looked up when none is configured
pub const DEFAULT_SCRIPT: &str = "pptx_builder.py";

/// Interpreter used when no virtual environment is found
pub const FALLBACK_INTERPRETER: &str = "python";

const VENV_INTERPRETERS: [&str; 2] = [".venv/Scripts/python.exe", ".venv/bin/python"];

/// Builds the final document from a slide manifest.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentAssembler: Send + Sync {
    /// Produces `output` from the manifest at `manifest`.
    async fn assemble(&self, manifest: &Path, output: &Path) -> Result<()>;
}

/// Runs `<interpreter> <script> --manifest <path> --out <path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAssembler {
    interpreter: PathBuf,
    script: PathBuf,
}

impl CommandAssembler {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    /// Uses configured paths, discovering whatever is left unset.
    pub fn from_config(config: &AssemblerConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let roots = search_roots(&cwd, exe_dir.as_deref());

        let interpreter = config
            .interpreter
            .clone()
            .unwrap_or_else(|| discover_interpreter(&roots));
        let script = config
            .script
            .clone()
            .unwrap_or_else(|| discover_script(&roots));
        debug!(
            interpreter = %interpreter.display(),
            script = %script.display(),
            "document assembler resolved"
        );
        Self::new(interpreter, script)
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

fn search_roots(cwd: &Path, exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = vec![cwd.to_path_buf()];
    if let Some(dir) = exe_dir {
        if dir != cwd {
            roots.push(dir.to_path_buf());
        }
    }
    roots
}

/// First virtual-environment interpreter found under `roots`, else `python`.
pub fn discover_interpreter(roots: &[PathBuf]) -> PathBuf {
    roots
        .iter()
        .flat_map(|root| VENV_INTERPRETERS.iter().map(move |rel| root.join(rel)))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_INTERPRETER))
}

/// The builder script in the first root holding one.
///
/// Falls back to the bare name so the failure names the file it looked for.
pub fn discover_script(roots: &[PathBuf]) -> PathBuf {
    roots
        .iter()
        .map(|root| root.join(DEFAULT_SCRIPT))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT))
}

#[async_trait]
impl DocumentAssembler for CommandAssembler {
    #[instrument(skip_all, fields(output = %output.display()))]
    async fn assemble(&self, manifest: &Path, output: &Path) -> Result<()> {
        info!(
            interpreter = %self.interpreter.display(),
            script = %self.script.display(),
            "running document builder"
        );
        let status = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg("--manifest")
            .arg(manifest)
            .arg("--out")
            .arg(output)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                ReportError::assembler_spawn(
                    format!("failed to start {}", self.interpreter.display()),
                    e,
                )
            })?;

        if !status.success() {
            return Err(ReportError::assembler_exit(
                format!("{} exited with {status}", self.script.display()),
                status.code(),
            ));
        }
        info!("document built");
        Ok(())
    }
}
