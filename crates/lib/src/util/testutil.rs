//! Test utilities for stagebuild-lib.
//!
//! This module provides a recording [`CommandRunner`] so orchestration can be
//! tested without a cmake installation, and a fixed toolchain.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::cmake::{CommandRunner, Invocation, Phase};
use crate::execute::types::BuildError;
use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;
use crate::toolchain::{CompilerFamily, Toolchain};

/// Records every invocation and reports success, except for one optional
/// `(target, phase)` that exits with a chosen code.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  calls: Mutex<Vec<Invocation>>,
  failure: Option<(String, Phase, Option<i32>)>,
}

impl RecordingRunner {
  pub fn failing(target: &str, phase: Phase, code: Option<i32>) -> Self {
    Self {
      calls: Mutex::default(),
      failure: Some((target.to_string(), phase, code)),
    }
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.calls.lock().unwrap().clone()
  }
}

impl CommandRunner for RecordingRunner {
  async fn run(&self, invocation: &Invocation) -> Result<Option<i32>, BuildError> {
    self.calls.lock().unwrap().push(invocation.clone());

    match &self.failure {
      Some((target, phase, code)) if *target == invocation.target && *phase == invocation.phase => Ok(*code),
      _ => Ok(Some(0)),
    }
  }
}

/// A Linux GNU toolchain with fixed parallelism and no generator.
pub fn test_toolchain() -> Toolchain {
  Toolchain {
    compiler: CompilerFamily::Gnu,
    debug: false,
    platform: Platform::new(Arch::X86_64, Os::Linux),
    parallel: Some(2),
    generator: None,
    ninja_available: false,
    archflags: None,
    cmake: PathBuf::from("cmake"),
  }
}
