// Shared between test binaries, not all of which use every helper.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script into `dir` that stands in for the release
/// decision engine. It runs with the workspace as its working directory and
/// must print `false` or a release object on stdout.
pub fn write_decider(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("decider.sh");
    // Drain the request from stdin first, like the real engine does.
    std::fs::write(&path, format!("#!/bin/sh\ncat >/dev/null\n{body}\n")).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

/// A decider that always reports the same release.
pub fn release_decider(dir: &Path, version: &str, notes: &str, channel: Option<&str>) -> PathBuf {
    let channel = channel
        .map(|channel| format!(r#","channel":"{channel}""#))
        .unwrap_or_default();
    write_decider(
        dir,
        &format!(r#"printf '%s' '{{"version":"{version}","notes":"{notes}"{channel}}}'"#),
    )
}

/// A decider that never finds anything to release.
pub fn no_release_decider(dir: &Path) -> PathBuf {
    write_decider(dir, "printf '%s' 'false'")
}

/// A decider that only finds a release once a synthetic commit of
/// `commit_type` is the tip of the branch.
pub fn synthetic_only_decider(dir: &Path, commit_type: &str, version: &str) -> PathBuf {
    write_decider(
        dir,
        &format!(
            r#"last=$(git log --format=%s -n 1)
if [ "$last" = "{commit_type}: synthetic" ]; then
  printf '%s' '{{"version":"{version}","notes":"synthetic change"}}'
else
  printf '%s' 'false'
fi"#
        ),
    )
}

/// A decider that fails with structured JSON on stderr, the way the real
/// engine reports upstream errors.
pub fn failing_decider(dir: &Path, code: &str, message: &str) -> PathBuf {
    write_decider(
        dir,
        &format!(r#"printf '%s' '{{"code":"{code}","message":"{message}"}}' >&2; exit 1"#),
    )
}
