pub const APP_NAME: &str = "stagebuild";

/// Configuration cache written by the configure phase. Removed before every reconfigure.
pub const CMAKE_CACHE_FILE: &str = "CMakeCache.txt";

/// Working-directory namespace for library targets under the temp dir.
pub const LIBRARY_NAMESPACE: &str = "cmake_clib";

/// Working-directory namespace for extension targets under the temp dir.
pub const EXTENSION_NAMESPACE: &str = "cmake_ext";

/// Default temp dir, relative to the plan file.
pub const DEFAULT_TEMP_DIR: &str = "build/temp";

/// Default staged prefix dir, relative to the plan file.
pub const DEFAULT_PREFIX_DIR: &str = "build/lib";

pub const BUILD_TYPE_KEY: &str = "CMAKE_BUILD_TYPE";
pub const INSTALL_PREFIX_KEY: &str = "CMAKE_INSTALL_PREFIX";
pub const INSTALL_RPATH_KEY: &str = "CMAKE_INSTALL_RPATH";
pub const PARALLEL_LEVEL_KEY: &str = "CMAKE_BUILD_PARALLEL_LEVEL";
pub const OSX_ARCHITECTURES_KEY: &str = "CMAKE_OSX_ARCHITECTURES";
