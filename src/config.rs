use std::fs::Metadata;
use std::io;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OldFolderError, Result};

/// Fixed 365-day year
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Which filesystem timestamp decides a file's age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeKind {
    #[default]
    Modified,
    Accessed,
    Created,
}

/// What to do with a subdirectory that contains no files at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyDirPolicy {
    /// Treat it as old (nothing inside is recent)
    #[default]
    Old,
    /// Never move it
    Keep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub time_kind: TimeKind,
    pub seconds_per_year: u64,
    pub empty_dirs: EmptyDirPolicy,
}

impl TimeKind {
    /// Name shown in console messages
    pub fn label(&self) -> &'static str {
        match self {
            TimeKind::Modified => "modified",
            TimeKind::Accessed => "accessed",
            TimeKind::Created => "created",
        }
    }

    /// Read this kind of timestamp from file metadata.
    ///
    /// `Created` falls back to the inode change time on Unix filesystems
    /// that cannot report a birth time.
    pub fn read(&self, metadata: &Metadata) -> io::Result<DateTime<Utc>> {
        let time = match self {
            TimeKind::Modified => metadata.modified()?,
            TimeKind::Accessed => metadata.accessed()?,
            TimeKind::Created => match metadata.created() {
                Ok(time) => time,
                Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                    return change_time(metadata).ok_or(e);
                }
                Err(e) => return Err(e),
            },
        };
        Ok(time.into())
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn change_time(_metadata: &Metadata) -> Option<DateTime<Utc>> {
    None
}

impl std::fmt::Display for TimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            time_kind: TimeKind::default(),
            seconds_per_year: SECONDS_PER_YEAR,
            empty_dirs: EmptyDirPolicy::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn new(time_kind: TimeKind) -> Self {
        Self {
            time_kind,
            ..Self::default()
        }
    }

    pub fn with_empty_dirs(mut self, policy: EmptyDirPolicy) -> Self {
        self.empty_dirs = policy;
        self
    }

    /// Compute `now - years` using the configured year length.
    ///
    /// A span too large to represent yields the earliest representable
    /// instant, so no file can be older than it.
    pub fn cutoff(&self, now: DateTime<Utc>, years: f64) -> Result<DateTime<Utc>> {
        if !years.is_finite() || years < 0.0 {
            return Err(OldFolderError::InvalidThreshold { years });
        }

        let millis = years * self.seconds_per_year as f64 * 1000.0;
        let cutoff = Duration::try_milliseconds(millis as i64)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Ok(cutoff)
    }
}
