//! Terminal rendering for plans, link offsets and build reports.
//!
//! Each printer pairs with a `render_*` function that builds the uncolored
//! line, so the layout can be tested without a terminal.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use stagebuild_lib::cmake::Phase;
use stagebuild_lib::{RunReport, TargetKind};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Leading glyph of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  Done,
  Failed,
  Caution,
  Note,
  Target,
}

impl Mark {
  fn glyph(self) -> &'static str {
    match self {
      Mark::Done => "✓",
      Mark::Failed => "✗",
      Mark::Caution => "⚠",
      Mark::Note => "•",
      Mark::Target => "→",
    }
  }

  fn print(self, message: &str) {
    let glyph = self.glyph();
    match self {
      Mark::Done => println!("{} {message}", glyph.if_supports_color(Stream::Stdout, |s| s.green())),
      Mark::Note => println!("{} {message}", glyph.if_supports_color(Stream::Stdout, |s| s.blue())),
      Mark::Target => println!("{} {message}", glyph.if_supports_color(Stream::Stdout, |s| s.cyan())),
      Mark::Failed => eprintln!(
        "{} {}",
        glyph.if_supports_color(Stream::Stderr, |s| s.red()),
        message.if_supports_color(Stream::Stderr, |s| s.red())
      ),
      Mark::Caution => eprintln!(
        "{} {}",
        glyph.if_supports_color(Stream::Stderr, |s| s.yellow()),
        message.if_supports_color(Stream::Stderr, |s| s.yellow())
      ),
    }
  }
}

/// Wall-clock time of a build: `850ms`, `12.4s`, `3m 07s`.
pub fn render_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  match secs {
    0 => format!("{}ms", elapsed.subsec_millis()),
    1..60 => format!("{:.1}s", elapsed.as_secs_f64()),
    _ => format!("{}m {:02}s", secs / 60, secs % 60),
  }
}

/// A command line as a shell would accept it back. Empty arguments and
/// arguments with whitespace or quotes are double-quoted.
pub fn render_command(program: &str, args: &[String]) -> String {
  std::iter::once(program)
    .chain(args.iter().map(String::as_str))
    .map(quote_arg)
    .collect::<Vec<_>>()
    .join(" ")
}

fn quote_arg(arg: &str) -> String {
  if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"') {
    return arg.to_string();
  }
  format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn render_target(name: &str, kind: TargetKind) -> String {
  format!("{name} ({kind})")
}

pub fn render_link(extension: &str, library: &str) -> String {
  format!("{extension} {} {library}", Mark::Target.glyph())
}

/// Summary rows of a finished build. The synced count only appears for
/// develop builds.
pub fn render_summary(report: &RunReport, develop: bool) -> Vec<(&'static str, String)> {
  let mut rows = vec![
    ("Libraries", report.libraries().to_string()),
    ("Extensions", report.extensions().to_string()),
  ];
  if develop {
    rows.push(("Synced files", report.synced.len().to_string()));
  }
  rows
}

pub fn print_field(label: &str, value: impl Display) {
  println!(
    "  {}: {value}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

pub fn print_note(message: &str) {
  Mark::Note.print(message);
}

pub fn print_warning(message: &str) {
  Mark::Caution.print(message);
}

pub fn print_error(err: &anyhow::Error) {
  Mark::Failed.print(&format!("{err:#}"));
}

pub fn print_target(name: &str, kind: TargetKind) {
  Mark::Target.print(&render_target(name, kind));
}

pub fn print_phase(phase: Phase, program: &str, args: &[String]) {
  print_field(phase.as_str(), render_command(program, args));
}

pub fn print_link(extension: &str, library: &str) {
  println!("{}", render_link(extension, library));
}

pub fn print_summary(report: &RunReport, elapsed: Duration, develop: bool) {
  Mark::Done.print(&format!(
    "Build complete in {} ({} target(s))",
    render_elapsed(elapsed),
    report.total()
  ));
  for (label, value) in render_summary(report, develop) {
    print_field(label, value);
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
