//! CMake invocation for a single target.
//!
//! Each target goes through three external-process phases run in its own
//! working directory:
//!
//! 1. `cmake <source_dir> <configure flags...>`
//! 2. `cmake --build . <build flags...>`
//! 3. `cmake --install . <install flags...>`
//!
//! [`args`] turns a resolved target plus the toolchain into those flags,
//! [`runner`] owns the process seam, and [`pipeline`] sequences the phases.

pub mod args;
pub mod pipeline;
pub mod runner;

pub use args::{CmakeArgs, assemble};
pub use pipeline::{prepare_work_dir, run_pipeline};
pub use runner::{CommandRunner, Invocation, Phase, ProcessRunner};
