//! End-to-end orchestration tests against a fake cmake.

#![cfg(unix)]

mod common;
mod develop_tests;
mod pipeline_tests;
