//! # Go Toolchain Invocation
//!
//! Runs `go build` for the two build-driven modes:
//!
//! - build-then-analyze: link a binary into a temporary directory
//! - build-analysis: a verbose `-work` build whose log and work directory
//!   are sized by archive
//!
//! Timeouts are left to the caller's environment; the build runs to completion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use heft_utils::{debug, info, warn};
use tempfile::TempDir;
use thiserror::Error;

const GO: &str = "go";
const TARGET_NAME: &str = "heft-target";

/// Failure to run the Go toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError
{
    /// The `go` command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn
    {
        command: String,
        source: io::Error,
    },

    /// The build exited unsuccessfully.
    #[error("`{command}` failed with {status}:\n{output}")]
    Failed
    {
        command: String,
        status: ExitStatus,
        /// Combined stdout and stderr of the build
        output: String,
    },

    /// The temporary output directory could not be created.
    #[error("Failed to create temporary directory: {0}")]
    TempDir(#[source] io::Error),
}

/// A binary linked into a temporary directory. The directory is removed on drop.
#[derive(Debug)]
pub struct BuiltBinary
{
    dir: TempDir,
}

impl BuiltBinary
{
    pub fn path(&self) -> PathBuf
    {
        self.dir.path().join(TARGET_NAME)
    }
}

/// Options shared by both build modes.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions
{
    pub tags: Option<String>,
    pub packages: Vec<String>,
}

impl BuildOptions
{
    fn push_common(&self, args: &mut Vec<String>)
    {
        if let Some(tags) = self.tags.as_deref().filter(|tags| !tags.is_empty()) {
            args.push("-tags".to_string());
            args.push(tags.to_string());
        }
        args.extend(self.packages.iter().cloned());
    }
}

/// `go build -o <tmp>/heft-target [-tags T] [PACKAGES]`
///
/// ## Errors
///
/// Returns [`ToolchainError`] if the build cannot start or fails.
pub fn build_binary(options: &BuildOptions) -> Result<BuiltBinary, ToolchainError>
{
    let dir = TempDir::new().map_err(ToolchainError::TempDir)?;
    let output = dir.path().join(TARGET_NAME);

    let mut args = vec!["build".to_string(), "-o".to_string(), output.display().to_string()];
    options.push_common(&mut args);
    run_go(&args)?;

    info!(binary = %output.display(), "binary built");
    Ok(BuiltBinary { dir })
}

/// `go build -work -a -x -o <tmp>/heft-target [-tags T] [PACKAGES]`, returning the build log.
///
/// A failed build still yields its log: the archives compiled before the
/// failure are worth reporting.
///
/// ## Errors
///
/// Returns [`ToolchainError`] if the build cannot start.
pub fn build_with_work_dir(options: &BuildOptions) -> Result<String, ToolchainError>
{
    let dir = TempDir::new().map_err(ToolchainError::TempDir)?;
    let output = dir.path().join(TARGET_NAME);

    let mut args = ["build", "-work", "-a", "-x", "-o"].map(str::to_string).to_vec();
    args.push(output.display().to_string());
    options.push_common(&mut args);

    match run_go(&args) {
        Ok(log) => Ok(log),
        Err(ToolchainError::Failed { command, status, output }) => {
            warn!(command = %command, %status, "build failed, analyzing partial output");
            Ok(output)
        }
        Err(err) => Err(err),
    }
}

/// Remove a `-work` directory left behind by the toolchain.
pub fn remove_work_dir(dir: &Path)
{
    if let Err(err) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), "failed to remove work directory: {err}");
    }
}

/// Run `go <args>` and return its combined output.
fn run_go(args: &[String]) -> Result<String, ToolchainError>
{
    let command = format!("{GO} {}", args.join(" "));
    debug!(command = %command, "running toolchain");

    let output = Command::new(GO)
        .args(args)
        .output()
        .map_err(|source| ToolchainError::Spawn {
            command: command.clone(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined)
    } else {
        Err(ToolchainError::Failed {
            command,
            status: output.status,
            output: combined,
        })
    }
}
