//! Candidate directory discovery and per-directory image scanning.
//!
//! Downloads unpack into directories named `NNNNNN-XXXXX`: a 6-digit order
//! identifier shared by the three scenes of one overflight and a 5-digit
//! scene identifier. Anything else in the working directory (site folders,
//! `sorted.txt`, backups) is ignored.

use regex::Regex;
use std::sync::LazyLock;

use crate::ingest::filename::extract_image_timestamp;
use crate::model::{CandidateDirectory, ImageMatch, SortError};

static CANDIDATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{6})-(\d{5})$").expect("valid candidate regex"));

/// Parses a directory name into a `CandidateDirectory`, or `None` if it does
/// not have the `NNNNNN-XXXXX` shape.
pub fn parse_candidate(name: &str) -> Option<CandidateDirectory> {
    let caps = CANDIDATE_NAME.captures(name)?;
    Some(CandidateDirectory {
        name: name.to_string(),
        common_id: caps[1].to_string(),
        variant_id: caps[2].to_string(),
    })
}

/// Filters a directory listing down to candidates, sorted by name so runs
/// are reproducible regardless of the order the OS lists entries in.
pub fn select_candidates<I, S>(names: I) -> Vec<CandidateDirectory>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates: Vec<CandidateDirectory> = names
        .into_iter()
        .filter_map(|n| parse_candidate(n.as_ref()))
        .collect();
    candidates.sort();
    candidates.dedup();
    candidates
}

/// What one candidate directory contributed to the scan.
#[derive(Debug)]
pub enum DirectoryScan {
    /// One or more qualifying image files, in filename order.
    Images(Vec<(String, ImageMatch)>),
    /// No file in the directory looked like a CSK image.
    NoImage,
    /// An image filename carried an impossible timestamp. The whole
    /// directory is skipped.
    Malformed(SortError),
}

/// Runs the filename extractor over every file in a directory.
///
/// A single malformed image name poisons the directory: its other images are
/// discarded, since it can no longer be placed reliably.
pub fn scan_directory_files<I, S>(filenames: I) -> DirectoryScan
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = filenames.into_iter().map(|s| s.as_ref().to_string()).collect();
    names.sort();

    let mut images = Vec::new();
    for name in names {
        match extract_image_timestamp(&name) {
            Ok(Some(image)) => images.push((name, image)),
            Ok(None) => {}
            Err(e) => return DirectoryScan::Malformed(e),
        }
    }

    if images.is_empty() {
        DirectoryScan::NoImage
    } else {
        DirectoryScan::Images(images)
    }
}
