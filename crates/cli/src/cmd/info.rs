use anyhow::Result;

use stagebuild_lib::platform::Platform;
use stagebuild_lib::toolchain::{Toolchain, ToolchainConfig, num_cpus};

use crate::output::{print_field, print_warning};

pub fn cmd_info() -> Result<()> {
  println!("System:");
  match Platform::host() {
    Ok(platform) => print_field("Platform", platform),
    Err(e) => print_warning(&e.to_string()),
  }
  print_field("Cores", num_cpus());

  println!("Toolchain:");
  match Toolchain::detect(&ToolchainConfig::default()) {
    Ok(toolchain) => {
      print_field("Compiler", format!("{:?}", toolchain.compiler).to_lowercase());
      print_field("CMake", toolchain.cmake.display());
      print_field("Generator", toolchain.generator.as_deref().unwrap_or("(default)"));
      print_field("Ninja", if toolchain.ninja_available { "found" } else { "not found" });
      let archs = toolchain.osx_architectures();
      if !archs.is_empty() {
        print_field("Architectures", archs.join(";"));
      }
    }
    Err(e) => print_warning(&format!("No usable toolchain: {e}")),
  }

  Ok(())
}
