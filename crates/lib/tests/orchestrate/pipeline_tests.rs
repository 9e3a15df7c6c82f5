//! Ordering, cache invalidation and failure propagation.

use stagebuild_lib::placeholder::PathToken;
use stagebuild_lib::{BuildError, BuildTarget, RunOptions, TargetKind};

use super::common::Workspace;

fn fmt_and_spdlog(ws: &Workspace) -> Vec<BuildTarget> {
  vec![
    BuildTarget::library("dep_fmt", ws.source("fmt"), PathToken::temp("prefix/fmt").unwrap()).unwrap(),
    BuildTarget::library(
      "dep_spdlog",
      ws.source("spdlog"),
      PathToken::temp("prefix/spdlog").unwrap(),
    )
    .unwrap()
    .configure("fmt_ROOT", PathToken::temp("prefix/fmt").unwrap()),
  ]
}

#[tokio::test]
async fn later_library_configures_against_installed_earlier_one() {
  let ws = Workspace::new();
  let targets = fmt_and_spdlog(&ws);

  let report = ws.run(&targets, &RunOptions::default()).await.unwrap();

  let fmt_prefix = ws.ctx.temp_dir().join("prefix/fmt");
  assert!(fmt_prefix.join("installed.marker").is_file());
  assert!(ws.ctx.temp_dir().join("prefix/spdlog/installed.marker").is_file());

  let calls = ws.calls();
  let phases: Vec<_> = calls.iter().map(|(phase, _, _)| phase.as_str()).collect();
  assert_eq!(
    phases,
    vec!["configure", "build", "install", "configure", "build", "install"]
  );

  let spdlog_work = ws.ctx.work_dir(TargetKind::Library, "dep_spdlog");
  let (_, cwd, args) = &calls[3];
  assert_eq!(cwd, &spdlog_work);
  assert!(args.contains(&format!("-Dfmt_ROOT={}", fmt_prefix.display())));
  assert!(args.contains(&format!("-DCMAKE_INSTALL_PREFIX={}/", ws.ctx.temp_dir().join("prefix/spdlog").display())));

  assert_eq!(report.libraries(), 2);
  assert_eq!(report.built[1].install_dir, ws.ctx.temp_dir().join("prefix/spdlog"));
}

#[tokio::test]
async fn stale_cache_is_replaced() {
  let ws = Workspace::new();
  let work_dir = ws.ctx.work_dir(TargetKind::Library, "dep_fmt");
  std::fs::create_dir_all(&work_dir).unwrap();
  std::fs::write(work_dir.join("CMakeCache.txt"), "stale").unwrap();

  ws.run(&fmt_and_spdlog(&ws), &RunOptions::default()).await.unwrap();

  assert_eq!(
    std::fs::read_to_string(work_dir.join("CMakeCache.txt")).unwrap().trim(),
    "fresh"
  );
}

#[tokio::test]
async fn rerun_succeeds() {
  let ws = Workspace::new();
  let targets = fmt_and_spdlog(&ws);

  ws.run(&targets, &RunOptions::default()).await.unwrap();
  ws.run(&targets, &RunOptions::default()).await.unwrap();

  assert_eq!(ws.calls().len(), 12);
}

#[tokio::test]
async fn failing_phase_stops_everything_after_it() {
  for (phase, expected_calls) in [("configure", 1), ("build", 2), ("install", 3)] {
    let ws = Workspace::new();
    let targets = fmt_and_spdlog(&ws);
    ws.write(&format!("src/fmt/fail-{phase}"), "");

    let result = ws.run(&targets, &RunOptions::default()).await;

    match (phase, &result) {
      ("configure", Err(BuildError::ConfigureFailed { target, code })) => {
        assert_eq!(target, "dep_fmt");
        assert_eq!(*code, Some(1));
      }
      ("build", Err(BuildError::BuildFailed { target, .. })) => assert_eq!(target, "dep_fmt"),
      ("install", Err(BuildError::InstallFailed { target, .. })) => assert_eq!(target, "dep_fmt"),
      _ => panic!("{phase}: unexpected result {result:?}"),
    }

    assert_eq!(ws.calls().len(), expected_calls, "{phase}: later phases must not run");
    assert!(!ws.ctx.work_dir(TargetKind::Library, "dep_spdlog").exists());
  }
}

#[tokio::test]
async fn reordered_targets_fail_without_running_cmake() {
  let ws = Workspace::new();
  let mut targets = fmt_and_spdlog(&ws);
  targets.reverse();

  let result = ws.run(&targets, &RunOptions::default()).await;

  assert!(matches!(
    result,
    Err(BuildError::UnresolvedPathReference { ref dependency, .. }) if dependency == "dep_fmt"
  ));
  assert!(ws.calls().is_empty());
}

#[tokio::test]
async fn build_args_reach_build_and_parallelism() {
  let ws = Workspace::new();
  let targets = vec![
    BuildTarget::library("dep", ws.source("dep"), "dep")
      .unwrap()
      .build_arg("CMAKE_BUILD_PARALLEL_LEVEL", "5"),
  ];

  ws.run(&targets, &RunOptions::default()).await.unwrap();

  let calls = ws.calls();
  assert_eq!(calls[1].2, "--build . -j5");
  assert_eq!(calls[2].2, "--install .");
}
