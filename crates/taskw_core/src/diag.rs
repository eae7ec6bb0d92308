//! Diagnostics block formatting.
//!
//! A failing test can attach the output of `task diag` to the output of the command that failed. The merged text
//! keeps the original output first, followed by a labelled block.

/// Subcommand that prints environment diagnostics.
pub const DIAG_SUBCOMMAND: &str = "diag";

/// Header line of the appended block.
pub const DIAG_HEADER: &str = "##### Debugging information (task diag): #####";

/// Shown in the stdout block when diagnostics produced no stdout.
pub const STDOUT_UNAVAILABLE: &str = "Not available, check STDERR";

/// Shown in the stderr block when diagnostics produced no stderr.
pub const STDERR_UNAVAILABLE: &str = "Not available, check STDOUT";

fn block(body: Option<&str>, placeholder: &str) -> String {
    format!("\n{DIAG_HEADER}\n{}", body.unwrap_or(placeholder))
}

fn append(prior: Option<&str>, block: String) -> String {
    match prior {
        Some(prior) => format!("{prior}{block}"),
        None => block,
    }
}

/// Append the diagnostics stdout block to a prior stdout.
pub fn merge_stdout(prior: Option<&str>, diag: Option<&str>) -> String {
    append(prior, block(diag, STDOUT_UNAVAILABLE))
}

/// Append the diagnostics stderr block to a prior stderr.
pub fn merge_stderr(prior: Option<&str>, diag: Option<&str>) -> String {
    append(prior, block(diag, STDERR_UNAVAILABLE))
}
