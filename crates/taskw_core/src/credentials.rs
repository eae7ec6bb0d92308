//! Credential identifier and server address formatting.

/// Build the `organization/user/userkey` identifier stored under `taskd.credentials`.
///
/// ## Examples
/// ```rust
/// use taskw_core::credentials_identifier;
/// assert_eq!(credentials_identifier("Org", "alice", "k-1"), "Org/alice/k-1");
/// ```
pub fn credentials_identifier(org: &str, user: &str, key: &str) -> String {
    [org, user, key].join("/")
}

/// Split an `organization/user/userkey` identifier back into its parts.
///
/// ## Returns
/// - `Some((org, user, key))` when there are exactly three non-empty parts, otherwise `None`.
pub fn parse_credentials(identifier: &str) -> Option<(&str, &str, &str)> {
    let mut parts = identifier.split('/');
    let org = parts.next()?;
    let user = parts.next()?;
    let key = parts.next()?;
    if parts.next().is_some() || org.is_empty() || user.is_empty() || key.is_empty() {
        return None;
    }
    Some((org, user, key))
}

/// Build the `host:port` string stored under `taskd.server`.
pub fn server_address(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}
