//! Generates `include/roster.h` from the `extern "C"` surface.
//!
//! Header generation never fails the build; problems surface as cargo
//! warnings so the Rust side still compiles and tests.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping header");
        return;
    };
    let include_dir = PathBuf::from(&crate_dir).join("include");
    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=cannot create {}: {e}", include_dir.display());
        return;
    }

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("ROSTER_FFI_H")
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(include_dir.join("roster.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
