//! Environment variables consumed and produced by the fixture.

/// Points the client at its data directory.
pub const TASKDATA: &str = "TASKDATA";

/// Points the client at its rc (configuration) file.
pub const TASKRC: &str = "TASKRC";

/// Overrides the client binary used when none is configured explicitly.
pub const TASKW_BIN: &str = "TASKW_BIN";

/// Client binary looked up on `PATH` when neither a path nor `TASKW_BIN` is given.
pub const DEFAULT_TASKW: &str = "task";

/// Time-override helper program looked up on `PATH`.
pub const FAKETIME_PROGRAM: &str = "faketime";

/// The pair of isolation overrides applied on top of the ambient environment.
///
/// ## Returns
/// - `[(name, value); 2]`: `TASKDATA` and `TASKRC`, in that order.
pub fn isolation_overrides<V>(datadir: V, taskrc: V) -> [(&'static str, V); 2] {
    [(TASKDATA, datadir), (TASKRC, taskrc)]
}
