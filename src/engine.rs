//! The seam to the external release decision engine.
//!
//! The engine is any command that reads a JSON request on stdin and answers
//! on stdout with either `false` (nothing to release) or a release object.
//! Failures are reported as JSON on stderr so they can be translated into
//! actionable diagnostics here.

use std::{
    io::{self, Write as _},
    path::{Path, PathBuf},
    process::Stdio,
};

use log::{debug, trace};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Everything the decision engine needs to compute the next release.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DecisionRequest<'a> {
    pub(crate) branches: &'a Value,
    pub(crate) current_branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tag_format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) plugins: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) repository_url: Option<&'a str>,
    /// Always `true`: the engine computes, this tool publishes.
    pub(crate) dry_run: bool,
}

/// The engine's verdict when there is something to release.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct NextRelease {
    /// Already tag-formatted, e.g. `v1.4.0` under the tag format `v${version}`.
    pub(crate) version: String,
    #[serde(default)]
    pub(crate) notes: String,
    /// The branch's channel with placeholders like `${name}` substituted,
    /// when the engine resolved one.
    #[serde(default)]
    pub(crate) channel: Option<String>,
}

/// Something that can answer a [`DecisionRequest`]. The process-spawning
/// implementation is the real one, tests script their own.
pub(crate) trait Decider {
    fn decide(&self, request: &DecisionRequest<'_>) -> Result<Option<NextRelease>, Error>;
}

/// Runs the decision engine as a subprocess in the workspace.
pub(crate) struct CommandDecider {
    command: String,
    workspace: PathBuf,
}

impl CommandDecider {
    pub(crate) fn new(command: String, workspace: &Path) -> Self {
        Self {
            command,
            workspace: workspace.to_path_buf(),
        }
    }
}

impl Decider for CommandDecider {
    fn decide(&self, request: &DecisionRequest<'_>) -> Result<Option<NextRelease>, Error> {
        let payload =
            serde_json::to_string(request).map_err(Error::EncodeRequest)?;
        debug!("Asking the decision engine: {}", self.command);
        trace!("Decision request: {payload}");

        let mut child = execute::command(&self.command)
            .current_dir(&self.workspace)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Exec {
                command: self.command.clone(),
                source,
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(payload.as_bytes()) {
                // An engine that answers without reading the whole request
                // closes its end of the pipe early, which is fine.
                if source.kind() != io::ErrorKind::BrokenPipe {
                    return Err(Error::Exec {
                        command: self.command.clone(),
                        source,
                    });
                }
            }
        }
        let output = child.wait_with_output().map_err(|source| Error::Exec {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(classify_failure(
                &String::from_utf8_lossy(&output.stderr),
                &output.status.to_string(),
            ));
        }
        let reply = String::from_utf8_lossy(&output.stdout);
        trace!("Decision reply: {}", reply.trim());
        parse_reply(reply.trim())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reply {
    Release(NextRelease),
    NoRelease(FalseOnly),
}

struct FalseOnly;

impl<'de> Deserialize<'de> for FalseOnly {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if bool::deserialize(deserializer)? {
            Err(serde::de::Error::custom("expected `false`"))
        } else {
            Ok(FalseOnly)
        }
    }
}

fn parse_reply(reply: &str) -> Result<Option<NextRelease>, Error> {
    match serde_json::from_str(reply) {
        Ok(Reply::Release(release)) => Ok(Some(release)),
        Ok(Reply::NoRelease(_)) => Ok(None),
        Err(source) => Err(Error::MalformedReply {
            reply: reply.to_string(),
            source,
        }),
    }
}

/// What a failed engine run left on stderr, when it was well-behaved enough
/// to report structured JSON.
#[derive(Default, Deserialize)]
struct UpstreamFailure {
    code: Option<String>,
    message: Option<String>,
}

fn classify_failure(stderr: &str, status: &str) -> Error {
    let stderr = stderr.trim();
    let failure: UpstreamFailure = serde_json::from_str(stderr).unwrap_or_default();
    let message = failure
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            if stderr.is_empty() {
                status.to_string()
            } else {
                stderr.to_string()
            }
        });
    match failure.code.as_deref() {
        Some("MODULE_NOT_FOUND") => Error::MissingPreset { message },
        Some("EGITNOPERMISSION") => Error::PushPermission,
        _ if message.contains("Invalid `tagFormat` option") => Error::InvalidTagFormat,
        _ => Error::Upstream { message },
    }
}

/// Parses the plugin list forwarded to the engine.
pub(crate) fn parse_plugins(raw: &str) -> Result<Value, Error> {
    serde_json::from_str(raw).map_err(|source| Error::MalformedPlugins {
        raw: raw.to_string(),
        source,
    })
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Could not encode the decision request: {0}")]
    #[diagnostic(code(engine::encode_request))]
    EncodeRequest(#[source] serde_json::Error),
    #[error("Could not run the decision engine `{command}`: {source}")]
    #[diagnostic(
        code(engine::exec),
        help("Check that the decision engine command exists and is executable.")
    )]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unexpected reply from the decision engine: {reply}")]
    #[diagnostic(
        code(engine::malformed_reply),
        help(
            "The engine must print either `false` or a JSON object with version, notes, and \
             an optional channel on stdout."
        )
    )]
    MalformedReply {
        reply: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("The commit analysis preset could not be loaded: {message}")]
    #[diagnostic(
        code(engine::missing_preset),
        help(
            "A non-default preset has to be installed before the decision engine can load it. \
             Add the preset package to the pipeline's extra dependencies."
        )
    )]
    MissingPreset { message: String },
    #[error("Not enough permission to push to the remote Git repository")]
    #[diagnostic(
        code(engine::push_permission),
        help(
            "When releasing a protected branch, authenticate with credentials that are allowed \
             to bypass the branch protection rules."
        )
    )]
    PushPermission,
    #[error("Invalid tag format")]
    #[diagnostic(
        code(engine::tag_format),
        help("The tag format must contain the version placeholder exactly once, e.g. v${{version}}.")
    )]
    InvalidTagFormat,
    #[error("The decision engine failed: {message}")]
    #[diagnostic(code(engine::upstream))]
    Upstream { message: String },
    #[error("Failed to parse release plugins: {raw}")]
    #[diagnostic(
        code(engine::malformed_plugins),
        help("The plugins input must be a JSON array of plugin names or [name, options] pairs.")
    )]
    MalformedPlugins {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}
