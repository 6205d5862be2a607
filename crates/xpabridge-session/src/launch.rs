//! Starting external programs: the viewer and the name server.
//!
//! The session layer only launches a viewer when a start policy is active
//! and nothing matched the template. The [`Launcher`] trait is the seam:
//! [`ProcessLauncher`] spawns real processes, tests plug in a launcher
//! that registers an in-memory target instead.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use xpabridge_transport::find_program;

use crate::{Programs, SessionError};

/// A process that was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    /// The executable that was run.
    pub program: PathBuf,
    /// OS process id, when the platform reports one.
    pub pid: Option<u32>,
}

/// Starts a viewer titled `title`.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one launcher can be shared by every open
///   call, including ones running on other tasks.
pub trait Launcher: Send + Sync + 'static {
    /// Starts the viewer with `-title <title>` followed by `extra_args`.
    ///
    /// Returns once the process is spawned, not once it is reachable;
    /// the caller polls for that.
    fn launch(
        &self,
        title: &str,
        extra_args: &[String],
    ) -> impl Future<Output = Result<Launched, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// LaunchCommand
// ---------------------------------------------------------------------------

/// A located program plus the arguments that must precede the caller's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

// ---------------------------------------------------------------------------
// ProcessLauncher
// ---------------------------------------------------------------------------

/// Launches real processes, locating them through [`Programs`].
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    programs: Programs,
}

impl ProcessLauncher {
    pub fn new(programs: Programs) -> Self {
        Self { programs }
    }

    pub fn programs(&self) -> &Programs {
        &self.programs
    }

    /// How to start the viewer.
    ///
    /// Searches the configured directory and `PATH`; on macOS falls back to
    /// the application bundle, started through `open -a <bundle> --args`.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] if the viewer can't be found.
    pub fn viewer_command(&self) -> Result<LaunchCommand, SessionError> {
        let programs = &self.programs;
        if let Some(program) = find_program(
            programs.bin_dir.as_deref(),
            programs.search_path,
            &programs.viewer,
        ) {
            return Ok(LaunchCommand {
                program,
                args: Vec::new(),
            });
        }
        if cfg!(target_os = "macos") {
            if let Some(bundle) = programs.app_bundle.as_deref().and_then(find_app_bundle) {
                return Ok(LaunchCommand {
                    program: PathBuf::from("open"),
                    args: vec![
                        "-a".to_string(),
                        bundle.to_string_lossy().into_owned(),
                        "--args".to_string(),
                    ],
                });
            }
        }
        Err(SessionError::Configuration(programs.viewer.clone()))
    }

    /// Path of the name server executable.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] if it can't be found.
    pub fn name_server_path(&self) -> Result<PathBuf, SessionError> {
        let programs = &self.programs;
        find_program(
            programs.bin_dir.as_deref(),
            programs.search_path,
            &programs.name_server,
        )
        .ok_or_else(|| SessionError::Configuration(programs.name_server.clone()))
    }

    /// Starts the name server with `-e`, which makes it exit straight away
    /// if another name server is already running.
    pub async fn start_name_server(&self) -> Result<Launched, SessionError> {
        let program = self.name_server_path()?;
        let launched = spawn_detached(&program, &["-e".to_string()])?;
        tracing::info!(program = %program.display(), pid = ?launched.pid, "started name server");
        Ok(launched)
    }
}

impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        title: &str,
        extra_args: &[String],
    ) -> Result<Launched, SessionError> {
        let command = self.viewer_command()?;
        let mut args = command.args;
        args.push("-title".to_string());
        args.push(title.to_string());
        args.extend(extra_args.iter().cloned());

        let launched = spawn_detached(&command.program, &args)?;
        tracing::info!(
            program = %launched.program.display(),
            pid = ?launched.pid,
            title,
            "launched viewer"
        );
        Ok(launched)
    }
}

/// Spawns `program` and lets it outlive the handle.
fn spawn_detached(program: &Path, args: &[String]) -> Result<Launched, SessionError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| SessionError::Launch {
            program: program.display().to_string(),
            source,
        })?;
    Ok(Launched {
        program: program.to_path_buf(),
        pid: child.id(),
    })
}

/// Looks for `bundle` under `/Applications`, `$HOME`, `$HOME/Applications`
/// and `$HOME/Desktop`.
fn find_app_bundle(bundle: &str) -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from("/Applications")];
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join("Applications"));
        dirs.push(home.join("Desktop"));
        dirs.insert(1, home);
    }
    dirs.into_iter()
        .map(|dir| dir.join(bundle))
        .find(|path| path.exists())
}
