//! The taskd server seam.
//!
//! A client fixture only needs a handful of facts about a server: where its certificates live, how to reach it,
//! and which user to sync as. [`TaskdServer`] captures exactly that, so a fixture can be bound to a real
//! server fixture or to the in-memory [`StaticTaskdServer`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use taskw_core::credentials_identifier;

use crate::error::FixtureResult;

/// A user registered with a taskd server: `(user, group, organization, user key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskdUser {
    pub user: String,
    pub group: String,
    pub org: String,
    pub key: String,
}

impl TaskdUser {
    pub fn new(
        user: impl Into<String>,
        group: impl Into<String>,
        org: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
            org: org.into(),
            key: key.into(),
        }
    }

    /// The `org/user/key` identifier written to `taskd.credentials`.
    pub fn credentials(&self) -> String {
        credentials_identifier(&self.org, &self.user, &self.key)
    }
}

/// What a client fixture needs from a taskd server fixture.
pub trait TaskdServer: Send + Sync {
    /// Directory holding the generated client certificate and key.
    fn cert_path(&self) -> &Path;

    /// CA certificate the client should trust.
    fn ca_cert(&self) -> &Path;

    /// Address the server listens on.
    fn address(&self) -> &str;

    fn port(&self) -> u16;

    /// User shared by every client that does not ask for its own.
    fn default_user(&self) -> TaskdUser;

    /// Register a brand-new user with the server.
    fn create_user(&self) -> FixtureResult<TaskdUser>;
}

/// A fixed description of a server that is managed elsewhere.
///
/// New users are minted locally as `user<N>` in the default user's group and organization, with a sequential
/// UUID-shaped key. Nothing is registered with a real server.
#[derive(Debug)]
pub struct StaticTaskdServer {
    cert_path: PathBuf,
    ca_cert: PathBuf,
    address: String,
    port: u16,
    default_user: TaskdUser,
    minted: AtomicU64,
}

impl StaticTaskdServer {
    pub fn new(
        cert_path: impl Into<PathBuf>,
        ca_cert: impl Into<PathBuf>,
        address: impl Into<String>,
        port: u16,
        default_user: TaskdUser,
    ) -> Self {
        Self {
            cert_path: cert_path.into(),
            ca_cert: ca_cert.into(),
            address: address.into(),
            port,
            default_user,
            minted: AtomicU64::new(0),
        }
    }
}

impl TaskdServer for StaticTaskdServer {
    fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    fn ca_cert(&self) -> &Path {
        &self.ca_cert
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn default_user(&self) -> TaskdUser {
        self.default_user.clone()
    }

    fn create_user(&self) -> FixtureResult<TaskdUser> {
        let n = self.minted.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(TaskdUser::new(
            format!("user{n}"),
            self.default_user.group.clone(),
            self.default_user.org.clone(),
            format!("00000000-0000-4000-8000-{n:012x}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> StaticTaskdServer {
        StaticTaskdServer::new(
            "/srv/taskd/certs",
            "/srv/taskd/certs/ca.cert.pem",
            "localhost",
            53589,
            TaskdUser::new("john", "Group", "Public", "f4a2c0de-0000-4000-8000-000000000000"),
        )
    }

    #[test]
    fn test_credentials_order() {
        let user = TaskdUser::new("john", "Group", "Public", "k");
        assert_eq!(user.credentials(), "Public/john/k");
    }

    #[test]
    fn test_create_user_is_fresh() {
        let server = server();
        let a = server.create_user().unwrap();
        let b = server.create_user().unwrap();
        assert_ne!(a, b);
        assert_ne!(a, server.default_user());
        assert_eq!(a.org, "Public");
        assert_eq!(b.key, "00000000-0000-4000-8000-000000000002");
    }
}
