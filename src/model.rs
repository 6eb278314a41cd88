//! CandidateDirectory, ImageTimestamp, BatchKey, assignments, SortError:
//! core data structures and error handling.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no I/O; only types and the small constructors that keep their
//! invariants.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Naming conventions
// ---------------------------------------------------------------------------

/// Date format used in destination directory names, e.g. `20170803`.
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// Default name of the append-only move log in the working directory.
pub const DEFAULT_MOVE_LOG: &str = "sorted.txt";

/// Number of directories produced by one overflight.
pub const TRIAD_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Scan types
// ---------------------------------------------------------------------------

/// A downloaded scene directory whose name has the shape `NNNNNN-XXXXX`.
///
/// Field order matters: the derived `Ord` sorts by raw name first, which is
/// the run order of the whole sorter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CandidateDirectory {
    pub name: String,
    /// 6-digit identifier shared by the three directories of an order.
    pub common_id: String,
    /// 5-digit identifier distinguishing the scenes of an order.
    pub variant_id: String,
}

impl fmt::Display for CandidateDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Acquisition start time embedded in an image filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageTimestamp(NaiveDateTime);

impl ImageTimestamp {
    /// Builds a timestamp from its six fields. Returns `None` when the fields
    /// do not form a real calendar date and time (e.g. month 13, Feb 30).
    pub fn from_fields(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(ImageTimestamp)
    }

    /// The six fields as `(year, month, day, hour, minute, second)`.
    pub fn fields(&self) -> (i32, u32, u32, u32, u32, u32) {
        let dt = self.0;
        (dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second())
    }

    /// Zero-padded `YYYYMMDD` form used in destination names.
    pub fn date_stamp(&self) -> String {
        self.0.format(DATE_STAMP_FORMAT).to_string()
    }
}

impl fmt::Display for ImageTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Grouping key: filename prefix plus the calendar day of the start time.
///
/// Only the day of the *start* timestamp is used. An overflight spanning
/// midnight splits into two keys; downstream tooling relies on that.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BatchKey(String);

impl BatchKey {
    pub fn new(prefix: &str, year: &str, month: &str, day: &str) -> Self {
        BatchKey(format!("{prefix}{year}{month}{day}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the extractor recovers from one qualifying image filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    pub prefix: String,
    pub key: BatchKey,
    pub timestamp: ImageTimestamp,
}

// ---------------------------------------------------------------------------
// Pass direction
// ---------------------------------------------------------------------------

/// Satellite pass direction during acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassDirection {
    /// South-to-north. Earliest scene maps to the northernmost site.
    Ascending,
    /// North-to-south. Site order is reversed.
    Descending,
}

impl FromStr for PassDirection {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(PassDirection::Ascending),
            "desc" => Ok(PassDirection::Descending),
            _ => Err(SortError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for PassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassDirection::Ascending => write!(f, "asc"),
            PassDirection::Descending => write!(f, "desc"),
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment types
// ---------------------------------------------------------------------------

/// One directory's destination: the site it images and the acquisition day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteAssignment {
    pub directory: CandidateDirectory,
    pub site: String,
    pub timestamp: ImageTimestamp,
    /// `YYYYMMDD` acquisition date.
    pub date: String,
}

impl SiteAssignment {
    pub fn new(directory: CandidateDirectory, site: &str, timestamp: ImageTimestamp) -> Self {
        SiteAssignment {
            directory,
            site: site.to_string(),
            date: timestamp.date_stamp(),
            timestamp,
        }
    }

    /// Destination relative to the working directory: `<site>/<date>_<site>`.
    pub fn target_relative(&self) -> PathBuf {
        PathBuf::from(&self.site).join(format!("{}_{}", self.date, self.site))
    }
}

/// The three site assignments of one complete overflight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchAssignment {
    pub key: BatchKey,
    pub entries: Vec<SiteAssignment>,
}

/// A batch that did not hold exactly three directories with one image each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteBatch {
    pub key: BatchKey,
    /// Distinct directories in the batch.
    pub count: usize,
    /// Image files in the batch; exceeds `count` when a directory repeats.
    pub images: usize,
    pub members: Vec<String>,
}

impl fmt::Display for IncompleteBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch {} should hold {} directories but holds {}",
            self.key, TRIAD_SIZE, self.count
        )?;
        if self.images != self.count {
            write!(f, " with {} images", self.images)?;
        }
        write!(f, " ({})", self.members.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while sorting scene directories.
///
/// Only `Usage`, `NoCandidateDirectories`, `Config` and listing the working
/// directory itself are fatal to a run; the rest are reported per unit.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("{0}")]
    Usage(String),

    #[error("no directories matching NNNNNN-XXXXX found in {}", .0.display())]
    NoCandidateDirectories(PathBuf),

    #[error("malformed timestamp in {filename}: {reason}")]
    MalformedTimestamp { filename: String, reason: String },

    #[error("pass direction must be asc or desc, got '{0}'")]
    InvalidDirection(String),

    #[error("a site set needs exactly 3 labels, got {0}")]
    InvalidSiteCount(usize),

    #[error("unknown site set '{0}'")]
    UnknownSiteSet(String),

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
