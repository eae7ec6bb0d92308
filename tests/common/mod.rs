//! Shared helpers for integration tests.
//!
//! The tests run against `fake-task`, a small POSIX shell stand-in for the taskwarrior client. It honours
//! `TASKDATA`/`TASKRC`, keeps tasks in `$TASKDATA/pending.data`, and refuses `config` unless the rc file
//! disables confirmations, like the real client would prompt.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use taskw_fixture::{StaticTaskdServer, Task, TaskdUser, TeardownRegistry};

const FAKE_TASK: &str = r#"#!/bin/sh
rc="${TASKRC:?TASKRC not set}"
data="${TASKDATA:?TASKDATA not set}"
cmd="$1"
[ $# -gt 0 ] && shift

case "$cmd" in
  config)
    grep -qx 'confirmation=no' "$rc" || { echo "Are you sure you want to change the value? (yes/no)" >&2; exit 1; }
    [ "$1" = "--" ] && shift
    key="$1"
    value="$2"
    awk -v k="$key=" 'index($0, k) != 1' "$rc" > "$rc.tmp" && mv "$rc.tmp" "$rc"
    printf '%s=%s\n' "$key" "$value" >> "$rc"
    echo "Config file $rc modified."
    ;;
  _get)
    key="${1#rc.}"
    awk -v k="$key=" 'index($0, k) == 1 { print substr($0, length(k) + 1) }' "$rc"
    ;;
  add)
    printf '%s\n' "$*" >> "$data/pending.data"
    echo "Created task $(wc -l < "$data/pending.data" | tr -d ' ')."
    ;;
  list)
    [ -s "$data/pending.data" ] || { echo "No matches."; exit 1; }
    cat -n "$data/pending.data"
    ;;
  diag)
    echo "fake-task 1.0"
    echo "   Data: $data"
    echo " Config: $rc"
    ;;
  now)
    echo "${FAKE_TIME:-real}"
    ;;
  noisy)
    echo "to stdout"
    echo "to stderr" >&2
    exit 3
    ;;
  echo-stdin)
    cat
    ;;
  crash)
    kill -9 $$
    ;;
  *)
    echo "Unknown command: $cmd" >&2
    exit 2
    ;;
esac
"#;

/// Stand-in for `faketime`: `fake-faketime -f <spec> <program> <args...>`.
const FAKE_FAKETIME: &str = r#"#!/bin/sh
[ "$1" = "-f" ] || { echo "expected -f" >&2; exit 99; }
FAKE_TIME="$2"
export FAKE_TIME
shift 2
exec "$@"
"#;

fn scripts_dir() -> &'static Path {
    // Written once per test binary: rewriting an executable while other threads fork leads to ETXTBSY.
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::Builder::new().prefix("taskw_fixture_bin_").tempdir().unwrap().keep();
        write_script(&dir.join("fake-task"), FAKE_TASK);
        write_script(&dir.join("fake-faketime"), FAKE_FAKETIME);
        dir
    })
}

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Path of the fake client.
pub fn fake_taskw() -> String {
    scripts_dir().join("fake-task").to_string_lossy().into_owned()
}

/// Path of the fake time-override helper.
pub fn fake_faketime() -> PathBuf {
    scripts_dir().join("fake-faketime")
}

/// A private registry, so parallel tests never tear down each other's fixtures.
pub fn registry() -> Arc<TeardownRegistry> {
    Arc::new(TeardownRegistry::new())
}

/// A fixture running the fake client.
pub fn task(registry: &Arc<TeardownRegistry>) -> Task {
    Task::builder()
        .taskw(fake_taskw())
        .registry(Arc::clone(registry))
        .build()
        .expect("fixture construction failed")
}

pub fn default_user() -> TaskdUser {
    TaskdUser::new("john", "Group", "Public", "0d9c4d1e-3f3b-4b0e-9a55-7c1f4b1f2a10")
}

pub fn server() -> Arc<StaticTaskdServer> {
    Arc::new(StaticTaskdServer::new(
        "/srv/taskd/certs",
        "/srv/taskd/certs/ca.cert.pem",
        "localhost",
        53589,
        default_user(),
    ))
}

/// Read one rc value through the client.
pub fn rc_value(task: &Task, key: &str) -> String {
    let name = format!("rc.{key}");
    let out = task.run_success(&["_get", name.as_str()], None, false).unwrap();
    out.stdout().trim_end().to_string()
}
