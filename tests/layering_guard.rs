//! Layering guardrails to keep the vocabulary crate free of dependencies.
//!
//! `taskw_core` holds names and pure helpers only. This test scans its `Cargo.toml` and fails if a
//! `[dependencies]` table gains any entry.

#[test]
fn core_crate_has_no_dependencies() {
    let manifest = include_str!("../crates/taskw_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit a dependency table.
        if line.starts_with('[') {
            in_dependencies = line.ends_with("dependencies]") && !line.contains("dev-dependencies");
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if !line_no_comment.is_empty() {
            panic!("`taskw_core` must stay dependency-free, found: {line_no_comment}");
        }
    }
}

