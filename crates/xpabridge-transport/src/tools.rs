//! Transport that drives the XPA command-line clients.
//!
//! Each primitive runs one of `xpaaccess`, `xpaget`, `xpaset` or `xpainfo`.
//! Fan-out happens here rather than inside the clients: the template is
//! first resolved with `xpaaccess -v`, then the command runs once per
//! matched id. That keeps one reply slot per target, each with its own
//! data and error, which the clients would otherwise concatenate.
//!
//! Child processes are spawned with `kill_on_drop`, so a timed-out or
//! abandoned call never leaves a client running.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::{Method, Reply, ReplySet, Request, Transport, TransportError, find_program};

/// Prefix the XPA clients put on error lines.
const ERROR_PREFIX: &str = "XPA$ERROR";

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// Where to find the XPA clients and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory searched first for the client programs.
    pub bin_dir: Option<PathBuf>,

    /// Whether to fall back to the directories on `PATH`.
    pub search_path: bool,

    /// Name server address passed as `-i <addr>`, e.g. `"localhost:14285"`.
    /// `None` leaves the clients' own default in place.
    pub name_server: Option<String>,

    /// Upper bound on a single client invocation.
    pub timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            search_path: true,
            name_server: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// XpaTools
// ---------------------------------------------------------------------------

/// A [`Transport`] backed by the XPA command-line clients.
///
/// Programs are located lazily, on the first primitive that needs them, so
/// constructing an `XpaTools` never fails.
#[derive(Debug, Clone, Default)]
pub struct XpaTools {
    config: ToolsConfig,
}

/// Captured result of one client run.
struct ToolOutput {
    stdout: Vec<u8>,
    stderr: String,
    status: std::process::ExitStatus,
}

impl XpaTools {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    /// Finds the client program implementing `method`.
    ///
    /// # Errors
    /// Returns [`TransportError::ToolNotFound`] if it is neither in
    /// `bin_dir` nor (when enabled) on `PATH`.
    pub fn locate(&self, method: Method) -> Result<PathBuf, TransportError> {
        let program = method.program();
        find_program(
            self.config.bin_dir.as_deref(),
            self.config.search_path,
            program,
        )
        .ok_or_else(|| TransportError::ToolNotFound(program.to_string()))
    }

    async fn run(
        &self,
        method: Method,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<ToolOutput, TransportError> {
        let program = method.program();
        let path = self.locate(method)?;

        let mut command = Command::new(&path);
        if let Some(ns) = &self.config.name_server {
            command.arg("-i").arg(ns);
        }
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| {
            TransportError::Spawn {
                program: program.to_string(),
                source,
            }
        })?;

        let exchange = async move {
            if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
                // A client that exits early closes its end; its own error
                // output is more useful than the broken pipe.
                match pipe.write_all(data).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(TransportError::Io(e)),
                }
            }
            child.wait_with_output().await.map_err(TransportError::Io)
        };

        let output = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| {
                TransportError::Timeout(self.config.timeout, program.to_string())
            })??;

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status,
        })
    }

    /// Runs `xpaaccess -v` and turns its listing into reply slots.
    async fn access_points(
        &self,
        template: &str,
        access_type: Option<&str>,
        max_targets: usize,
    ) -> Result<ReplySet, TransportError> {
        let mut args = vec!["-v", template];
        if let Some(t) = access_type {
            args.push(t);
        }
        let output = self.run(Method::Access, &args, None).await?;
        Ok(parse_access_listing(
            &String::from_utf8_lossy(&output.stdout),
            &output.stderr,
            max_targets,
        ))
    }

    /// Issues a get/set/info against a single, already resolved id.
    async fn issue(
        &self,
        request: &Request<'_>,
        id: &str,
        name: String,
    ) -> Result<Reply, TransportError> {
        let mut args: Vec<&str> = Vec::new();
        let mut stdin = None;
        if request.method == Method::Set {
            match request.payload {
                Some(payload) => stdin = Some(payload),
                None => args.push("-p"),
            }
        }
        args.push(id);
        if let Some(params) = request.params {
            args.push(params);
        }

        let output = self.run(request.method, &args, stdin).await?;
        let errors = collect_errors(&output.stderr);
        let error = if !errors.is_empty() {
            Some(errors.join("\n"))
        } else if !output.status.success() {
            let stderr = output.stderr.trim();
            Some(if stderr.is_empty() {
                format!("{} exited with {}", request.method.program(), output.status)
            } else {
                stderr.to_string()
            })
        } else {
            None
        };

        let data = if request.method == Method::Get {
            output.stdout
        } else {
            Vec::new()
        };
        Ok(Reply { name, data, error })
    }
}

impl Transport for XpaTools {
    async fn exchange(
        &self,
        request: Request<'_>,
    ) -> Result<ReplySet, TransportError> {
        if request.method == Method::Access {
            return self
                .access_points(request.template, request.params, request.max_targets)
                .await;
        }

        let points = self
            .access_points(request.template, None, request.max_targets)
            .await?;
        let mut replies = ReplySet::with_capacity(request.max_targets);
        for point in points {
            if point.error.is_some() {
                replies.push(point);
                continue;
            }
            let id = point
                .name
                .split_whitespace()
                .nth(1)
                .unwrap_or(point.name.as_str())
                .to_string();
            tracing::debug!(method = %request.method, %id, "issuing to access point");
            let reply = self.issue(&request, &id, point.name).await?;
            replies.push(reply);
        }
        Ok(replies)
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Error messages from `XPA$ERROR` lines, prefix removed.
fn collect_errors(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter_map(|line| line.trim().strip_prefix(ERROR_PREFIX))
        .map(|rest| rest.trim_start_matches(':').trim().to_string())
        .filter(|msg| !msg.is_empty())
        .collect()
}

/// Turns `xpaaccess -v` output (`class:name id` per line) into slots.
/// Lines without both fields, such as a bare `no`, are skipped.
fn parse_access_listing(
    stdout: &str,
    stderr: &str,
    max_targets: usize,
) -> ReplySet {
    let mut replies = ReplySet::with_capacity(max_targets);
    for line in stdout.lines() {
        let mut fields = line.split_whitespace();
        if let (Some(name), Some(id)) = (fields.next(), fields.next()) {
            if !replies.push(Reply::ok(format!("{name} {id}"), Vec::new())) {
                break;
            }
        }
    }
    for error in collect_errors(stderr) {
        replies.push(Reply::failed("", error));
    }
    replies
}
