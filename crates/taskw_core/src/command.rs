//! Command-line construction.
//!
//! A fixture keeps a command *prefix*: the client binary, optionally preceded by the time-override helper as
//! `<helper> -f <spec>`. Every invocation appends its own arguments to a copy of that prefix.

/// Subcommand used to write rc entries.
pub const CONFIG_SUBCOMMAND: &str = "config";

/// Separator placed before `config` arguments so values starting with `-` (UUIDs, negative numbers) are not
/// mistaken for flags.
pub const END_OF_OPTIONS: &str = "--";

/// Flag selecting faketime's advanced time format.
pub const FAKETIME_FORMAT_FLAG: &str = "-f";

/// Number of leading elements a time override adds to a prefix.
pub const TIME_OVERRIDE_LEN: usize = 3;

/// Build `<program> config -- <key> <value>`.
pub fn config_args(program: &str, key: &str, value: &str) -> Vec<String> {
    vec![
        program.to_string(),
        CONFIG_SUBCOMMAND.to_string(),
        END_OF_OPTIONS.to_string(),
        key.to_string(),
        value.to_string(),
    ]
}

/// Append invocation arguments to a copy of the prefix.
pub fn full_command<S: AsRef<str>>(prefix: &[String], args: &[S]) -> Vec<String> {
    let mut command = Vec::with_capacity(prefix.len() + args.len());
    command.extend(prefix.iter().cloned());
    command.extend(args.iter().map(|a| a.as_ref().to_string()));
    command
}

/// Remove an active time override from the prefix.
///
/// ## Returns
/// - The prefix without the leading `<helper> -f <spec>` when it starts with `helper`, otherwise the prefix as-is.
pub fn strip_time_override<'a>(prefix: &'a [String], helper: &str) -> &'a [String] {
    match prefix.first() {
        Some(first) if first == helper => prefix.get(TIME_OVERRIDE_LEN..).unwrap_or(&[]),
        _ => prefix,
    }
}

/// Replace (or clear) the time override on a prefix.
///
/// ## Parameters
/// - `prefix`: the current command prefix, with or without an override.
/// - `helper`: resolved path of the time-override helper.
/// - `spec`: the fake time to apply; `None` clears the override.
///
/// ## Returns
/// - The new prefix: `[helper, "-f", spec, ..bare]` or just `bare`.
pub fn apply_time_override(prefix: &[String], helper: &str, spec: Option<&str>) -> Vec<String> {
    let bare = strip_time_override(prefix, helper);
    match spec {
        Some(spec) => {
            let mut out = Vec::with_capacity(bare.len() + TIME_OVERRIDE_LEN);
            out.push(helper.to_string());
            out.push(FAKETIME_FORMAT_FLAG.to_string());
            out.push(spec.to_string());
            out.extend(bare.iter().cloned());
            out
        }
        None => bare.to_vec(),
    }
}
