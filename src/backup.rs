//! Controller-side backups of the running configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::DEFAULT_BACKUP_DIR;
use crate::error::ReconcileError;

/// Result of one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackupOutcome {
    /// False when the target already held identical content.
    pub changed: bool,
    pub path: PathBuf,
    /// Hex SHA-256 of the written content.
    pub checksum: String,
}

/// Hex SHA-256 digest of a configuration.
pub fn config_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `backups/<prefix><unix-seconds>.cfg`.
pub fn default_backup_path(prefix: &str, unix_secs: u64) -> PathBuf {
    Path::new(DEFAULT_BACKUP_DIR).join(format!("{prefix}{unix_secs}.cfg"))
}

/// Writes `running` to `target`, or to a timestamped default path.
///
/// Missing parent directories are created. An existing file with the same
/// digest is left untouched and reported as unchanged.
pub fn backup_config(
    running: &str,
    target: Option<&Path>,
    prefix: &str,
) -> Result<BackupOutcome, ReconcileError> {
    let path = match target {
        Some(path) => path.to_path_buf(),
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            default_backup_path(prefix, secs)
        }
    };
    let checksum = config_checksum(running);

    if path.is_file() {
        let existing = fs::read(&path)?;
        if format!("{:x}", Sha256::digest(&existing)) == checksum {
            debug!("Backup {} is up to date", path.display());
            return Ok(BackupOutcome {
                changed: false,
                path,
                checksum,
            });
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, running)?;
    debug!("Backed up running config to {}", path.display());
    Ok(BackupOutcome {
        changed: true,
        path,
        checksum,
    })
}
