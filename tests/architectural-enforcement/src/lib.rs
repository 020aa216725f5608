//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code
//! - Async I/O only, outside of pre-runtime setup
//!
//! Both scanners walk the `src/` trees listed in [`PRODUCTION_DIRS`].

use std::path::PathBuf;

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["relay/core/src", "relay/proxy/src", "tui/src"];

/// Absolute path of a directory relative to the workspace root
#[must_use]
pub fn workspace_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

/// Every `.rs` file under the production trees
#[must_use]
pub fn production_sources() -> Vec<PathBuf> {
    PRODUCTION_DIRS
        .iter()
        .map(|dir| workspace_path(dir))
        .filter(|dir| dir.exists())
        .flat_map(|dir| {
            walkdir::WalkDir::new(dir)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
                .map(walkdir::DirEntry::into_path)
                .collect::<Vec<_>>()
        })
        .collect()
}
