//! stagebuild-lib: Core types and logic for stagebuild
//!
//! This crate builds an ordered list of CMake projects into one package tree:
//! - `BuildTarget`: a library or extension module with its configure settings
//! - `PathToken`: a path below the temp or staged directory, unknown until a run
//! - `BuildContext`: the directories of one run, against which tokens resolve
//! - `execute_targets`: configure, build and install every target in order

pub mod cmake;
pub mod consts;
pub mod context;
pub mod execute;
pub mod manifest;
pub mod placeholder;
pub mod platform;
pub mod rpath;
pub mod runtime_env;
pub mod target;
pub mod toolchain;

#[cfg(test)]
mod util;

pub use context::BuildContext;
pub use execute::{BuildError, RunOptions, RunReport, execute_targets};
pub use target::{BuildTarget, TargetKind};
