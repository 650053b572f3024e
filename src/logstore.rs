// src/logstore.rs

//! Per-run log files.
//!
//! Every run gets one `<unix-millis>.log` file holding the stdout and stderr
//! of both stages. Names handed back in by callers are checked to be a single
//! plain `.log` file name before they touch the filesystem.

use std::cmp::Reverse;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::errors::{DriverError, Result};

/// Extension shared by every run log.
pub const LOG_EXTENSION: &str = "log";

#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the log directory (and parents) if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating log dir {:?}", self.dir))?;
        Ok(())
    }

    /// Open a fresh log file for a new run.
    ///
    /// Names come from the current time in milliseconds; if that name is
    /// taken the timestamp is bumped until a free one is found.
    pub fn create(&self) -> Result<(String, File)> {
        self.ensure_dir()?;

        let mut stamp = now_millis();
        loop {
            let name = format!("{stamp}.{LOG_EXTENSION}");
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    info!(log = %name, "created run log");
                    return Ok((name, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(log = %name, "log name taken; bumping timestamp");
                    stamp += 1;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("creating log file {path:?}"))
                        .into());
                }
            }
        }
    }

    /// All run logs, most recent first.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("reading log dir {:?}", self.dir))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if has_log_extension(&name) {
                names.push(name);
            }
        }

        // Numeric stems first, newest to oldest; anything else after, by name.
        names.sort_by_key(|name| (Reverse(stem_millis(name)), Reverse(name.clone())));
        Ok(names)
    }

    /// Full text of one log.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        fs::read_to_string(&path).map_err(|e| not_found_or_io(name, e))
    }

    /// Remove one log.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).map_err(|e| not_found_or_io(name, e))?;
        info!(log = %name, "deleted run log");
        Ok(())
    }

    /// Map a caller-supplied name to a path strictly inside the log dir.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || name.contains(['/', '\\']) || !has_log_extension(name) {
            return Err(DriverError::InvalidLogName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

fn has_log_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == LOG_EXTENSION)
}

fn stem_millis(name: &str) -> Option<i128> {
    Path::new(name).file_stem()?.to_str()?.parse().ok()
}

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

fn not_found_or_io(name: &str, e: std::io::Error) -> DriverError {
    if e.kind() == ErrorKind::NotFound {
        DriverError::NotFound(name.to_string())
    } else {
        DriverError::Io(e)
    }
}
