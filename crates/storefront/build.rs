//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so it can be served with immutable caching:
//! `static/css/main.css` is copied to `static/css/derived/main.<hash>.css`
//! and the hash is exported as `CSS_HASH` for the `css_hash` filter.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 digest kept in file names.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"),
    );
    let static_dir = manifest_dir.join("static");

    println!("cargo:rerun-if-changed=templates");

    match fingerprint(&static_dir.join("css"), "main", "css") {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Could not fingerprint main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Copy `<dir>/<stem>.<ext>` to `<dir>/derived/<stem>.<hash>.<ext>`.
fn fingerprint(dir: &Path, stem: &str, ext: &str) -> io::Result<String> {
    let source = dir.join(format!("{stem}.{ext}"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = fs::read(&source)?;
    let hash: String = format!("{:x}", Sha256::digest(&content))
        .chars()
        .take(HASH_LEN)
        .collect();

    let derived_dir = dir.join("derived");
    fs::create_dir_all(&derived_dir)?;
    fs::copy(&source, derived_dir.join(format!("{stem}.{hash}.{ext}")))?;

    Ok(hash)
}
