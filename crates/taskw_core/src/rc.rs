//! Well-known rc-file keys and file names.
//!
//! The rc file is plain text with one `key=value` pair per line.

/// Location of the task database.
pub const DATA_LOCATION: &str = "data.location";

/// Interactive confirmation prompts; always disabled for fixtures.
pub const CONFIRMATION: &str = "confirmation";

/// Client certificate used to talk to a taskd server.
pub const TASKD_CERTIFICATE: &str = "taskd.certificate";

/// Client private key used to talk to a taskd server.
pub const TASKD_KEY: &str = "taskd.key";

/// CA certificate the client trusts.
pub const TASKD_CA: &str = "taskd.ca";

/// `host:port` of the taskd server.
pub const TASKD_SERVER: &str = "taskd.server";

/// `org/user/key` identifier of the synchronising user.
pub const TASKD_CREDENTIALS: &str = "taskd.credentials";

/// Client certificate file name inside a server's certificate directory.
pub const CLIENT_CERT_FILE: &str = "test_client.cert.pem";

/// Client key file name inside a server's certificate directory.
pub const CLIENT_KEY_FILE: &str = "test_client.key.pem";

/// Default rc file name inside the private data directory.
pub const DEFAULT_TASKRC_NAME: &str = "test.rc";

/// Default prefix for private data directories.
pub const DEFAULT_DATADIR_PREFIX: &str = "task_";

/// Render one rc line (including the trailing newline).
pub fn rc_line(key: &str, value: &str) -> String {
    format!("{key}={value}\n")
}

/// Contents written to a fresh rc file.
///
/// `config` cannot be used until confirmations are off, so these two entries are written directly.
pub fn initial_contents(datadir: &str) -> String {
    let mut out = rc_line(DATA_LOCATION, datadir);
    out.push_str(&rc_line(CONFIRMATION, "no"));
    out
}
