//! VRP dialect constants and reconciliation options.
//!
//! The constants describe the small part of the VRP CLI grammar the core
//! needs to know about: how commands are negated, how views are entered and
//! left, and how the running configuration is persisted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Token that negates a VRP command.
pub const UNDO_TOKEN: &str = "undo";

/// Command that persists the running configuration.
pub const SAVE_COMMAND: &str = "save";

/// Command that enters system view from user view.
pub const SYSTEM_VIEW_COMMAND: &str = "system-view";

/// Command that leaves the current sub-view.
pub const QUIT_COMMAND: &str = "quit";

/// Command that returns to user view from any view.
pub const RETURN_COMMAND: &str = "return";

/// Command the transport layer issues to capture the running configuration.
pub const RUNNING_CONFIG_COMMAND: &str = "display current-configuration";

/// Command the transport layer issues to read device facts.
pub const VERSION_COMMAND: &str = "display version";

/// Confirmation prompts VRP prints after `save`.
pub const SAVE_CONFIRM_PROMPTS: &[&str] = &[
    r"Are you sure to continue\?\s*\[Y/N\]:?",
    r"startup saved-configuration file on peer device\?\[Y/N\]:?",
    r"The current configuration will be written to the device\. Continue\? \[Y/N\]:?",
];

/// Confirmation prompts raised by configuration commands, keyed by command
/// shape: (command pattern, prompt pattern, answer).
pub const COMMAND_CONFIRM_PROMPTS: &[(&str, &str, &str)] =
    &[(r"^local-user \S+ privilege level\s", r"[Yy]/[Nn]", "y")];

/// Answer sent to a save confirmation prompt.
pub const SAVE_CONFIRM_ANSWER: &str = "y";

/// Directory used for backups when no explicit path is given.
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// When to append a save command to the emitted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaveWhen {
    /// Save even when nothing changed.
    Always,
    /// Save only when at least one configuration command is emitted.
    #[default]
    Changed,
    /// Never save.
    Never,
}

impl SaveWhen {
    /// Returns true when a save command must follow a diff with the given outcome.
    pub fn should_save(self, changed: bool) -> bool {
        match self {
            SaveWhen::Always => true,
            SaveWhen::Changed => changed,
            SaveWhen::Never => false,
        }
    }
}

/// Read-only options for one reconciliation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Compute the diff as a dry run; the caller must not push the commands.
    pub check_mode: bool,
    /// Save policy.
    pub save_when: SaveWhen,
}

impl ReconcileOptions {
    /// Dry-run options with the default save policy.
    pub fn check_mode() -> Self {
        Self {
            check_mode: true,
            ..Self::default()
        }
    }

    pub fn with_save_when(mut self, save_when: SaveWhen) -> Self {
        self.save_when = save_when;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_policy_matrix() {
        assert!(SaveWhen::Always.should_save(false));
        assert!(SaveWhen::Always.should_save(true));
        assert!(SaveWhen::Changed.should_save(true));
        assert!(!SaveWhen::Changed.should_save(false));
        assert!(!SaveWhen::Never.should_save(true));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ReconcileOptions = serde_json::from_str("{}").expect("parse options");
        assert_eq!(opts, ReconcileOptions::default());
        assert_eq!(opts.save_when, SaveWhen::Changed);

        let opts: ReconcileOptions =
            serde_json::from_str(r#"{"check_mode":true,"save_when":"never"}"#)
                .expect("parse options");
        assert!(opts.check_mode);
        assert_eq!(opts.save_when, SaveWhen::Never);
    }
}
