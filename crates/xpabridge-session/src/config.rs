//! Session configuration.
//!
//! Everything here is plain data, built once (in code or from JSON) and
//! passed explicitly to the resolver, the launcher and each session. There
//! are no process-wide tables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xpabridge_marshal::ArrayMarshaller;
use xpabridge_transport::DEFAULT_MAX_TARGETS;

use crate::SessionError;

// ---------------------------------------------------------------------------
// StartPolicy
// ---------------------------------------------------------------------------

/// What to do when opening a session finds no live target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StartPolicy {
    /// Fail straight away.
    #[default]
    Never,

    /// Launch the viewer titled after the template, with `extra_args`
    /// appended to its command line, then poll until it registers.
    Launch {
        #[serde(default)]
        extra_args: Vec<String>,
    },
}

impl StartPolicy {
    /// Launch with no extra arguments.
    pub fn launch() -> Self {
        Self::Launch {
            extra_args: Vec::new(),
        }
    }

    /// Launch with the given extra arguments.
    pub fn launch_with<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Launch {
            extra_args: args.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandTable
// ---------------------------------------------------------------------------

/// Which viewer commands return binary data, and which replies keep their
/// trailing whitespace.
///
/// Matching is on the whole command string, so `"fits"` is binary but
/// `"fits width"` is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTable {
    /// Commands whose replies are bytes, not text.
    pub binary: Vec<String>,
    /// Text commands whose replies are returned untrimmed. Binary
    /// commands are always untrimmed.
    pub no_strip: Vec<String>,
}

impl CommandTable {
    /// Returns `true` if `params` names a binary command.
    pub fn is_binary(&self, params: Option<&str>) -> bool {
        params.is_some_and(|p| self.binary.iter().any(|c| c == p))
    }

    /// Returns `true` if replies to `params` get trailing whitespace removed.
    /// Binary replies are never trimmed.
    pub fn strips(&self, params: Option<&str>) -> bool {
        !self.is_binary(params)
            && !params.is_some_and(|p| self.no_strip.iter().any(|c| c == p))
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            binary: list(&[
                "array",
                "fits",
                "fits image",
                "fits table",
                "fits slice",
                "gif",
                "jpeg",
                "mecube",
                "mosaic",
                "mosaicimage",
                "nrrd",
                "png",
                "rgbarray",
                "rgbcube",
                "rgbimage",
                "tiff",
            ]),
            no_strip: list(&["array", "fits", "regions"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

/// Names of the external programs and where to look for them.
///
/// Lookup happens on first use, so a missing program only matters to
/// callers that actually need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Programs {
    /// The viewer executable.
    pub viewer: String,
    /// The XPA name server.
    pub name_server: String,
    /// macOS application bundle tried when `viewer` isn't found.
    pub app_bundle: Option<String>,
    /// Directory searched before `PATH`.
    pub bin_dir: Option<PathBuf>,
    /// Whether to search `PATH`.
    pub search_path: bool,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            viewer: "ds9".to_string(),
            name_server: "xpans".to_string(),
            app_bundle: Some("SAOImage DS9.app".to_string()),
            bin_dir: None,
            search_path: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// How sessions are opened and how they talk to their target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Check the target is still alive before every call.
    pub verify: bool,

    /// What to do when nothing matches at open time.
    pub start: StartPolicy,

    /// How long to poll for a launched viewer.
    pub wait: Duration,

    /// Delay between polls.
    pub poll_interval: Duration,

    /// Capacity used for discovery calls.
    pub max_targets: usize,

    /// Title given to a launched viewer when the template is a glob.
    pub default_title: String,

    pub commands: CommandTable,

    /// External programs used by the default launcher.
    pub programs: Programs,

    #[serde(skip)]
    pub marshaller: ArrayMarshaller,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify: true,
            start: StartPolicy::Never,
            wait: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            max_targets: DEFAULT_MAX_TARGETS,
            default_title: "ds9".to_string(),
            commands: CommandTable::default(),
            programs: Programs::default(),
            marshaller: ArrayMarshaller::default(),
        }
    }
}

impl SessionConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// [`SessionError::InvalidConfig`] on malformed JSON or wrong types.
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Number of polls that fit in `wait`, at least one.
    pub fn poll_attempts(&self) -> u32 {
        if self.poll_interval.is_zero() {
            return 1;
        }
        let n = self.wait.as_millis() / self.poll_interval.as_millis().max(1);
        u32::try_from(n).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert!(config.verify);
        assert_eq!(config.start, StartPolicy::Never);
        assert_eq!(config.wait, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_targets, 1024);
        assert_eq!(config.poll_attempts(), 10);
    }

    #[test]
    fn test_command_table_matches_whole_command() {
        let table = CommandTable::default();
        assert!(table.is_binary(Some("fits")));
        assert!(table.is_binary(Some("rgbcube")));
        assert!(!table.is_binary(Some("fits width")));
        assert!(!table.is_binary(None));

        assert!(!table.strips(Some("regions")));
        assert!(table.strips(Some("fits width")));
        assert!(table.strips(None));
    }

    #[test]
    fn test_binary_commands_are_never_stripped() {
        let table = CommandTable {
            no_strip: Vec::new(),
            ..CommandTable::default()
        };
        for command in ["png", "jpeg", "gif", "tiff", "rgbcube", "fits"] {
            assert!(!table.strips(Some(command)), "{command}");
        }
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SessionConfig::from_json(
            r#"{
                "verify": false,
                "start": { "policy": "launch", "extra_args": ["-grid"] },
                "wait": { "secs": 3, "nanos": 0 }
            }"#,
        )
        .unwrap();
        assert!(!config.verify);
        assert_eq!(config.start, StartPolicy::launch_with(["-grid"]));
        assert_eq!(config.poll_attempts(), 3);
        assert_eq!(config.commands, CommandTable::default());
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = SessionConfig::from_json(r#"{ "verify": "yes" }"#).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn test_programs_round_trip_json() {
        let programs = Programs::default();
        let text = serde_json::to_string(&programs).unwrap();
        let back: Programs = serde_json::from_str(&text).unwrap();
        assert_eq!(back, programs);
        assert_eq!(back.viewer, "ds9");
    }
}
