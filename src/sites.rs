/// Site set registry and site assignment.
///
/// A site set names the three sub-areas covered by one CSK order, listed
/// north to south. Each overflight produces one scene per site; which scene
/// is which follows from acquisition order and pass direction. The built-in
/// registry is the single source of truth for site labels unless a site-set
/// file adds or overrides entries.
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::model::{PassDirection, SortError, TRIAD_SIZE};

// ---------------------------------------------------------------------------
// Built-in registry
// ---------------------------------------------------------------------------

/// A compiled-in site set.
pub struct BuiltinSiteSet {
    /// Code given on the command line.
    pub code: &'static str,
    pub description: &'static str,
    /// Labels in north-to-south order.
    pub labels: [&'static str; TRIAD_SIZE],
}

pub static SITE_SET_REGISTRY: &[BuiltinSiteSet] = &[
    BuiltinSiteSet {
        code: "eth",
        description: "Eyjafjallajokull, Tindfjoll and Hekla",
        labels: ["Eyja", "Tind", "Hekla"],
    },
    BuiltinSiteSet {
        code: "nms",
        description: "Generic north, middle and south sub-areas",
        labels: ["nth", "mid", "sth"],
    },
];

/// A site set resolved for a run, either built in or loaded from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSet {
    pub code: String,
    pub description: String,
    /// Labels in north-to-south order.
    pub labels: Vec<String>,
}

impl From<&BuiltinSiteSet> for SiteSet {
    fn from(b: &BuiltinSiteSet) -> Self {
        SiteSet {
            code: b.code.to_string(),
            description: b.description.to_string(),
            labels: b.labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Site-set file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SiteSetFile {
    #[serde(default)]
    site_set: Vec<SiteSetEntry>,
}

#[derive(Debug, Deserialize)]
struct SiteSetEntry {
    code: String,
    #[serde(default)]
    description: String,
    labels: Vec<String>,
}

/// Parses site sets from TOML text.
///
/// ```toml
/// [[site_set]]
/// code = "kat"
/// description = "Katla"
/// labels = ["kn", "km", "ks"]
/// ```
pub fn parse_site_sets(text: &str) -> Result<Vec<SiteSet>, SortError> {
    let file: SiteSetFile =
        toml::from_str(text).map_err(|e| SortError::Config(format!("invalid site-set file: {e}")))?;

    let mut seen = HashSet::new();
    let mut sets = Vec::with_capacity(file.site_set.len());
    for entry in file.site_set {
        let code = entry.code.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(SortError::Config("site set with an empty code".to_string()));
        }
        if !seen.insert(code.clone()) {
            return Err(SortError::Config(format!("site set '{code}' defined twice")));
        }
        validate_labels(&entry.labels)?;
        sets.push(SiteSet {
            code,
            description: entry.description,
            labels: entry.labels,
        });
    }
    Ok(sets)
}

/// Loads site sets from a TOML file.
pub fn load_site_sets(path: &Path) -> Result<Vec<SiteSet>, SortError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SortError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_site_sets(&text)
}

/// Labels become directory names, so they must be plain path components.
fn validate_labels(labels: &[String]) -> Result<(), SortError> {
    if labels.len() != TRIAD_SIZE {
        return Err(SortError::InvalidSiteCount(labels.len()));
    }
    for label in labels {
        if label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']) {
            return Err(SortError::Config(format!("'{label}' is not a usable site label")));
        }
    }
    let distinct: HashSet<_> = labels.iter().collect();
    if distinct.len() != labels.len() {
        return Err(SortError::Config(format!("duplicate site labels in {labels:?}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Looks up a site set by code, case-insensitively. Sets in `extra` take
/// precedence over built-in sets with the same code.
pub fn find_site_set(code: &str, extra: &[SiteSet]) -> Result<SiteSet, SortError> {
    let wanted = code.trim().to_ascii_lowercase();
    if let Some(set) = extra.iter().find(|s| s.code == wanted) {
        return Ok(set.clone());
    }
    SITE_SET_REGISTRY
        .iter()
        .find(|s| s.code == wanted)
        .map(SiteSet::from)
        .ok_or_else(|| SortError::UnknownSiteSet(code.to_string()))
}

/// Codes of every site set available for a run, built-in first.
pub fn available_codes(extra: &[SiteSet]) -> Vec<String> {
    let mut codes: Vec<String> = SITE_SET_REGISTRY.iter().map(|s| s.code.to_string()).collect();
    for set in extra {
        if !codes.contains(&set.code) {
            codes.push(set.code.clone());
        }
    }
    codes
}

// ---------------------------------------------------------------------------
// Site assignment
// ---------------------------------------------------------------------------

/// The three site labels in acquisition order for one pass direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSequence {
    labels: Vec<String>,
}

impl SiteSequence {
    /// Orients north-to-south `labels` for a pass: ascending keeps them,
    /// descending reverses them.
    pub fn for_pass(labels: &[String], direction: PassDirection) -> Result<Self, SortError> {
        if labels.len() != TRIAD_SIZE {
            return Err(SortError::InvalidSiteCount(labels.len()));
        }
        let mut labels = labels.to_vec();
        if direction == PassDirection::Descending {
            labels.reverse();
        }
        Ok(SiteSequence { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// String-level entry point: `assign(labels, "asc") == labels`,
/// `assign(labels, "desc") == reverse(labels)`.
pub fn assign(labels: &[String], direction: &str) -> Result<SiteSequence, SortError> {
    let direction: PassDirection = direction.parse()?;
    SiteSequence::for_pass(labels, direction)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
