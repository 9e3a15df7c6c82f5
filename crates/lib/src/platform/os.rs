use std::fmt;

/// Operating system variants supported by stagebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Token the dynamic loader expands to the directory of the loading binary.
  ///
  /// Windows has none; DLLs are found beside the module or on `PATH`.
  pub fn loader_origin(&self) -> Option<&'static str> {
    match self {
      Self::Linux => Some("$ORIGIN"),
      Self::MacOs => Some("@loader_path"),
      Self::Windows => None,
    }
  }

  /// Environment variable the loader searches for shared libraries.
  pub fn library_path_var(&self) -> &'static str {
    match self {
      Self::Linux => "LD_LIBRARY_PATH",
      Self::MacOs => "DYLD_LIBRARY_PATH",
      Self::Windows => "PATH",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
