//! Build script for the homebase backend.
//!
//! Copies `.env.example` into the local data directory, next to where
//! `config::load_env` looks for the real `.env`.

use std::{env, fs, path::PathBuf};

/// Installs the configuration template.
///
/// # Destination
///
/// - Linux: `~/.local/share/homebase/.env.example`
/// - macOS: `~/Library/Application Support/homebase/.env.example`
/// - Windows: `%LOCALAPPDATA%/homebase/.env.example`
///
/// A missing template only produces a cargo warning. Failing to create the
/// directory or write the copy fails the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let out_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homebase");
    fs::create_dir_all(&out_dir)?;

    if template.is_file() {
        fs::copy(&template, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
    }

    Ok(())
}
