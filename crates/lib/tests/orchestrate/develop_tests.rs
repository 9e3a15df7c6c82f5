//! Extensions: rpath injection and develop-mode synchronization.

use stagebuild_lib::placeholder::PathToken;
use stagebuild_lib::{BuildTarget, RunOptions, TargetKind};

use super::common::Workspace;

#[tokio::test]
async fn develop_mode_copies_staged_auxiliary_files() {
  let ws = Workspace::new();
  ws.write("src/ext/aux/libaux.so", "shared object");
  let develop_root = ws.root().join("tree");

  let targets = vec![
    BuildTarget::extension("pkg.ext._core", ws.source("ext"))
      .unwrap()
      .auxiliary_file("libaux.so")
      .auxiliary_file("libnot-built.so"),
  ];
  let options = RunOptions {
    develop_root: Some(develop_root.clone()),
  };

  let report = ws.run(&targets, &options).await.unwrap();

  let in_place = develop_root.join("pkg/ext/libaux.so");
  assert_eq!(std::fs::read_to_string(&in_place).unwrap(), "shared object");
  assert!(!develop_root.join("pkg/ext/libnot-built.so").exists());
  assert_eq!(report.synced.len(), 1);
  assert!(ws.ctx.prefix_dir().join("pkg/ext/libaux.so").is_file());
}

#[tokio::test]
async fn staged_build_leaves_source_tree_alone() {
  let ws = Workspace::new();
  ws.write("src/ext/aux/libaux.so", "shared object");

  let targets = vec![
    BuildTarget::extension("pkg._core", ws.source("ext"))
      .unwrap()
      .auxiliary_file("libaux.so"),
  ];

  let report = ws.run(&targets, &RunOptions::default()).await.unwrap();

  assert!(report.synced.is_empty());
  assert!(!ws.root().join("pkg").exists());
  assert_eq!(report.built[0].kind, TargetKind::Extension);
}

#[tokio::test]
async fn extension_receives_relative_library_paths() {
  let ws = Workspace::new();
  let targets = vec![
    BuildTarget::library(
      "libcore",
      ws.source("core"),
      PathToken::staged("pkg/ext/libcore").unwrap(),
    )
    .unwrap(),
    BuildTarget::extension("pkg.ext._core", ws.source("ext"))
      .unwrap()
      .link("libcore", Some("lib")),
  ];

  ws.run(&targets, &RunOptions::default()).await.unwrap();

  let calls = ws.calls();
  let (_, cwd, args) = &calls[3];
  assert_eq!(cwd, &ws.ctx.work_dir(TargetKind::Extension, "pkg.ext._core"));
  assert!(args.contains("-DLIBCORE_RELPATH=libcore/lib"));

  let origin = ws.toolchain.platform.os.loader_origin().unwrap();
  assert!(args.contains(&format!("-DCMAKE_INSTALL_RPATH={origin}/libcore/lib")));
  assert!(args.contains(&format!("-DCMAKE_INSTALL_PREFIX={}/", ws.ctx.prefix_dir().join("pkg/ext").display())));
}

#[tokio::test]
async fn relocated_extension_links_and_syncs_from_its_install_dir() {
  let ws = Workspace::new();
  ws.write("src/ext/aux/libaux.so", "shared object");
  let develop_root = ws.root().join("tree");

  let targets = vec![
    BuildTarget::library("libcore", ws.source("core"), PathToken::staged("pkg/libcore").unwrap()).unwrap(),
    BuildTarget::extension("pkg._core", ws.source("ext"))
      .unwrap()
      .with_install_dir(PathToken::staged("pkg/native").unwrap())
      .link("libcore", None)
      .auxiliary_file("libaux.so"),
  ];
  let options = RunOptions {
    develop_root: Some(develop_root.clone()),
  };

  ws.run(&targets, &options).await.unwrap();

  let calls = ws.calls();
  assert!(calls[3].2.contains("-DLIBCORE_RELPATH=../libcore"));
  assert!(develop_root.join("pkg/native/libaux.so").is_file());
  assert!(!develop_root.join("pkg/libaux.so").exists());
}
