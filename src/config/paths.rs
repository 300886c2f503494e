//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{anyhow, Result};
use dirs::config_dir;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GRACEFUL_WORKER_CONFIG";

const APP_DIR: &str = "graceful_worker";

/// Config path: $GRACEFUL_WORKER_CONFIG if set, else the OS-appropriate default.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push(APP_DIR);
        base.push("config.xml");
        return Ok(base);
    }
    env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".config").join(APP_DIR).join("config.xml"))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir and no HOME)"))
}

/// Default log file path, colocated with the config file.
pub fn default_log_path() -> Result<PathBuf> {
    let cfg = default_config_path()?;
    let dir = cfg
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(dir.join("graceful_worker.log"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}

/// Open a log file for appending; new files are created 0600 on Unix.
pub fn open_log_file_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600); // applies on create
    }
    opts.open(path)
}
