// Generates include/twist.h with `cbindgen` when the binary is installed;
// otherwise the checked-in header is copied to $OUT_DIR.
//
// Consumers include either:
//   - <repo>/twist-ffi/include/twist.h (checked-in)
//   - $OUT_DIR/twist.h

use std::{env, fs, path::PathBuf, process::Command};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/twist.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let header_repo = crate_dir.join("include").join("twist.h");
    let header_out = out_dir.join("twist.h");

    let generated = Command::new("cbindgen")
        .args(["--crate", "twist-ffi", "--lang", "C", "--output"])
        .arg(&header_out)
        .current_dir(&crate_dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    if generated {
        println!("cargo:warning=twist-ffi: generated header with cbindgen -> {}", header_out.display());
        return;
    }

    if header_repo.exists() {
        fs::copy(&header_repo, &header_out).expect("copy include/twist.h to OUT_DIR");
    } else {
        println!("cargo:warning=twist-ffi: no cbindgen and no checked-in header");
    }
}
