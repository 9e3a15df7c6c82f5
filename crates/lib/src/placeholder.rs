//! Path token parsing for deferred directory resolution.
//!
//! A target's install location, and the configure values that point at a
//! sibling target's output, are often unknown until the build mode is chosen.
//! Such values are written as tokens and resolved against a
//! [`BuildContext`](crate::context::BuildContext) right before use.
//!
//! # Token Formats
//!
//! - `$${temp:<offset>}` - `<offset>` below the temp/scratch directory
//! - `$${staged:<offset>}` - `<offset>` below the staged library root
//! - `$${temp}` / `$${staged}` - the directory itself
//!
//! # Values
//!
//! A [`PathValue`] is either a plain literal or exactly one token. Tokens do
//! not nest and cannot be embedded in longer strings: write
//! `$${staged:pkg/lib}` rather than `$${staged:pkg}/lib`.
//!
//! `$` characters pass through unchanged unless a run of them is followed by
//! `{`: exactly two open a token, and a longer run stands for itself minus
//! one `$`. So `$$${` is a literal `$${`, and `$$$${` a literal `$$${`.
//!
//! # Example
//!
//! ```
//! use stagebuild_lib::placeholder::{parse, PathToken, Segment};
//!
//! let segments = parse("$${temp:prefix/spdlog}").unwrap();
//! assert_eq!(segments, vec![Segment::Token(PathToken::temp("prefix/spdlog").unwrap())]);
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::context::normalize;

/// Which directory of the build context a token is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  /// The temp/scratch directory.
  Temp,
  /// The staged (or in-place) library root.
  Staged,
}

impl TokenKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      TokenKind::Temp => "temp",
      TokenKind::Staged => "staged",
    }
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A symbolic reference to a directory that is only known once a build
/// context exists. The offset is normalized and always relative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathToken {
  kind: TokenKind,
  offset: PathBuf,
}

impl PathToken {
  /// Create a token, normalizing the offset.
  ///
  /// # Errors
  ///
  /// Returns [`PlaceholderError::AbsoluteOffset`] if the offset is absolute.
  pub fn new(kind: TokenKind, offset: impl AsRef<Path>) -> Result<Self, PlaceholderError> {
    let offset = offset.as_ref();
    if offset.has_root() || offset.is_absolute() {
      return Err(PlaceholderError::AbsoluteOffset(offset.display().to_string()));
    }
    Ok(Self {
      kind,
      offset: normalize(offset),
    })
  }

  /// A token below the temp directory.
  pub fn temp(offset: impl AsRef<Path>) -> Result<Self, PlaceholderError> {
    Self::new(TokenKind::Temp, offset)
  }

  /// A token below the staged library root.
  pub fn staged(offset: impl AsRef<Path>) -> Result<Self, PlaceholderError> {
    Self::new(TokenKind::Staged, offset)
  }

  pub fn kind(&self) -> TokenKind {
    self.kind
  }

  pub fn offset(&self) -> &Path {
    &self.offset
  }
}

impl fmt::Display for PathToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let offset = slash_joined(&self.offset);
    if offset.is_empty() {
      write!(f, "$${{{}}}", self.kind)
    } else {
      write!(f, "$${{{}:{}}}", self.kind, offset)
    }
  }
}

/// A value that is either already concrete or waiting on a build context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathValue {
  Concrete(String),
  Token(PathToken),
}

impl PathValue {
  pub fn as_token(&self) -> Option<&PathToken> {
    match self {
      PathValue::Token(token) => Some(token),
      PathValue::Concrete(_) => None,
    }
  }
}

impl From<&str> for PathValue {
  fn from(value: &str) -> Self {
    PathValue::Concrete(value.to_string())
  }
}

impl From<String> for PathValue {
  fn from(value: String) -> Self {
    PathValue::Concrete(value)
  }
}

impl From<PathBuf> for PathValue {
  fn from(value: PathBuf) -> Self {
    PathValue::Concrete(value.to_string_lossy().into_owned())
  }
}

impl From<PathToken> for PathValue {
  fn from(value: PathToken) -> Self {
    PathValue::Token(value)
  }
}

impl fmt::Display for PathValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PathValue::Concrete(s) => write!(f, "{}", escape_literal(s)),
      PathValue::Token(token) => write!(f, "{token}"),
    }
  }
}

impl FromStr for PathValue {
  type Err = PlaceholderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_value(s)
  }
}

impl Serialize for PathValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for PathValue {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_value(&raw).map_err(serde::de::Error::custom)
  }
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no tokens)
  Literal(String),

  /// A token to be resolved
  Token(PathToken),
}

/// Errors that can occur during token parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed path token at position {0}")]
  Unclosed(usize),

  #[error("unknown path token type: {0}")]
  UnknownType(String),

  #[error("path token offset must be relative: {0}")]
  AbsoluteOffset(String),

  #[error("path token must be the whole value, found it embedded in '{0}'")]
  Embedded(String),
}

/// Parse a string containing tokens into segments.
///
/// # Errors
///
/// Returns an error if a token is unclosed, of unknown type, or has an
/// absolute offset.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    let mut run = 1;
    while chars.next_if(|&(_, c)| c == '$').is_some() {
      run += 1;
    }

    if chars.next_if(|&(_, c)| c == '{').is_none() {
      literal.extend(std::iter::repeat_n('$', run));
      continue;
    }

    match run {
      1 => literal.push_str("${"),
      2 => {
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let mut content = String::new();
        let mut found_close = false;

        for (_, c) in chars.by_ref() {
          if c == '}' {
            found_close = true;
            break;
          }
          content.push(c);
        }

        if !found_close {
          return Err(PlaceholderError::Unclosed(pos));
        }

        segments.push(Segment::Token(parse_token_content(&content)?));
      }
      // escaped: one `$` of the run is dropped
      _ => {
        literal.extend(std::iter::repeat_n('$', run - 1));
        literal.push('{');
      }
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Write `literal` so that [`parse`] reads it back unchanged: every run of
/// two or more `$` directly before `{` gains one `$`.
pub fn escape_literal(literal: &str) -> String {
  let mut escaped = String::with_capacity(literal.len());
  let mut chars = literal.chars().peekable();

  while let Some(ch) = chars.next() {
    if ch != '$' {
      escaped.push(ch);
      continue;
    }

    let mut run = 1;
    while chars.next_if_eq(&'$').is_some() {
      run += 1;
    }
    if run >= 2 && chars.peek() == Some(&'{') {
      run += 1;
    }
    escaped.extend(std::iter::repeat_n('$', run));
  }

  escaped
}

/// Parse the content inside a token (everything between `{` and `}`).
fn parse_token_content(content: &str) -> Result<PathToken, PlaceholderError> {
  let (kind, offset) = content.split_once(':').unwrap_or((content, ""));

  let kind = match kind {
    "temp" => TokenKind::Temp,
    "staged" => TokenKind::Staged,
    _ => return Err(PlaceholderError::UnknownType(kind.to_string())),
  };

  PathToken::new(kind, offset)
}

/// Parse a whole value: a literal, or exactly one token.
///
/// # Errors
///
/// Returns [`PlaceholderError::Embedded`] when a token is mixed with literal
/// text or with other tokens.
pub fn parse_value(input: &str) -> Result<PathValue, PlaceholderError> {
  let mut segments = parse(input)?;

  match segments.len() {
    0 => Ok(PathValue::Concrete(String::new())),
    1 => match segments.remove(0) {
      Segment::Literal(s) => Ok(PathValue::Concrete(s)),
      Segment::Token(token) => Ok(PathValue::Token(token)),
    },
    // literals only split around tokens, so more than one segment means a token is embedded
    _ => Err(PlaceholderError::Embedded(input.to_string())),
  }
}

fn slash_joined(path: &Path) -> String {
  path
    .components()
    .filter_map(|c| match c {
      Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
      Component::ParentDir => Some("..".to_string()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}
