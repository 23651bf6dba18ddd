// Generate the C header with `cbindgen` when it is installed; otherwise copy
// the checked-in `include/brookside.h` to $OUT_DIR.
//
// Consumers can include the header from either:
//   - <repo>/brookside-ffi/include/brookside.h   (checked-in)
//   - $OUT_DIR/brookside.h

use std::{env, fs, path::PathBuf, process::Command};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/brookside.h");

    let (Some(crate_dir), Some(out_dir)) = (env::var_os("CARGO_MANIFEST_DIR"), env::var_os("OUT_DIR")) else {
        println!("cargo:warning=brookside-ffi: cargo env missing; skipping header");
        return;
    };
    let crate_dir = PathBuf::from(crate_dir);
    let header_repo = crate_dir.join("include").join("brookside.h");
    let header_out = PathBuf::from(out_dir).join("brookside.h");

    let generated = Command::new("cbindgen")
        .args(["--crate", "brookside-ffi", "--lang", "C", "--output"])
        .arg(&header_out)
        .current_dir(&crate_dir)
        .status()
        .is_ok_and(|s| s.success());

    if generated {
        println!("cargo:warning=brookside-ffi: generated header with cbindgen -> {}", header_out.display());
        return;
    }

    if let Err(e) = fs::copy(&header_repo, &header_out) {
        println!("cargo:warning=brookside-ffi: could not copy {}: {e}", header_repo.display());
    }
}
