//! Build script for favsync.
//!
//! Copies the `.env.example` configuration template and an example skiplist into the
//! user's local data directory so they sit next to the files the binary reads.

use std::{env, fs, path::PathBuf};

/// Copies the configuration templates into `<local-data>/favsync/`.
///
/// Missing templates only produce a cargo warning. Directory creation and copy
/// failures abort the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");
    println!("cargo:rerun-if-changed=skiplist.example.csv");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("favsync");
    fs::create_dir_all(&out_dir)?;

    for template in [".env.example", "skiplist.example.csv"] {
        let source = manifest_dir.join(template);
        if source.is_file() {
            let contents = fs::read_to_string(&source)?;
            fs::write(out_dir.join(template), contents)?;
        } else {
            println!("cargo:warning={} not found at {}", template, source.display());
        }
    }

    Ok(())
}
