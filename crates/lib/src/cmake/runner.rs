//! Subprocess execution for cmake invocations.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::BuildError;

/// One of the three pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Configure,
  Build,
  Install,
}

impl Phase {
  pub fn as_str(&self) -> &'static str {
    match self {
      Phase::Configure => "configure",
      Phase::Build => "build",
      Phase::Install => "install",
    }
  }

  /// The error reported when this phase exits unsuccessfully.
  pub fn failure(&self, target: &str, code: Option<i32>) -> BuildError {
    let target = target.to_string();
    match self {
      Phase::Configure => BuildError::ConfigureFailed { target, code },
      Phase::Build => BuildError::BuildFailed { target, code },
      Phase::Install => BuildError::InstallFailed { target, code },
    }
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A single cmake process to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  /// Name of the target being built, for log tagging.
  pub target: String,
  pub phase: Phase,
  pub program: PathBuf,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  /// Variables added on top of the inherited environment.
  pub env: BTreeMap<String, String>,
}

impl Invocation {
  /// The command line as a single display string.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.to_string_lossy().into_owned())
      .chain(self.args.iter().cloned())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Runs invocations and reports their exit code.
///
/// `Ok(None)` means the process ended without an exit code (killed by a
/// signal). Only failures to start or talk to the process are errors.
pub trait CommandRunner {
  fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<Option<i32>, BuildError>> + Send;
}

/// Runs cmake as a child process, streaming its output into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
  async fn run(&self, invocation: &Invocation) -> Result<Option<i32>, BuildError> {
    info!(
      name = %invocation.target,
      phase = %invocation.phase,
      cmd = %invocation.command_line(),
      "running cmake"
    );
    debug!(cwd = ?invocation.cwd, env = ?invocation.env, "spawning process");

    let mut child = Command::new(&invocation.program)
      .args(&invocation.args)
      .current_dir(&invocation.cwd)
      .envs(&invocation.env)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    tokio::try_join!(
      stream_lines(stdout, &invocation.target, invocation.phase),
      stream_lines(stderr, &invocation.target, invocation.phase),
    )?;

    let status = child.wait().await?;
    debug!(name = %invocation.target, phase = %invocation.phase, ?status, "process exited");

    Ok(status.code())
  }
}

/// Forward each line of a child pipe to the log as it arrives.
async fn stream_lines<R>(pipe: Option<R>, target: &str, phase: Phase) -> std::io::Result<()>
where
  R: AsyncRead + Unpin,
{
  let Some(pipe) = pipe else {
    return Ok(());
  };

  let mut lines = BufReader::new(pipe).split(b'\n');
  while let Some(line) = lines.next_segment().await? {
    let line = String::from_utf8_lossy(&line);
    let line = line.trim_end_matches('\r');
    info!(name = %target, phase = %phase, "{line}");
  }

  Ok(())
}
