//! Run Report Module
//!
//! Renders the plan shown to the operator before confirmation and the
//! summary of what a run actually did. The summary can also be written as
//! JSON for batch bookkeeping.

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::model::{IncompleteBatch, PassDirection, SortError};
use crate::reorganize::Plan;

// ============================================================================
// Run Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub root: String,
    pub direction: String,
    pub site_set: String,
    /// Site labels in acquisition order for this pass.
    pub sequence: Vec<String>,
    pub dry_run: bool,
    pub candidates: Vec<String>,
    pub moved: Vec<MoveRecord>,
    pub failed_moves: Vec<FailedMove>,
    pub incomplete_batches: Vec<IncompleteBatch>,
    pub unmatched_directories: Vec<String>,
    pub skipped_directories: Vec<SkippedDirectory>,
    /// Moves that succeeded but could not be appended to the move log.
    pub move_log_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub directory: String,
    pub site: String,
    pub date: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub directory: String,
    pub from: String,
    pub to: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDirectory {
    pub directory: String,
    pub reason: String,
}

impl RunSummary {
    /// An empty summary carrying the plan's context.
    pub fn from_plan(plan: &Plan) -> Self {
        RunSummary {
            timestamp: Utc::now().to_rfc3339(),
            root: plan.root.display().to_string(),
            direction: plan.direction.to_string(),
            site_set: plan.site_set.code.clone(),
            sequence: plan.sequence.labels().to_vec(),
            dry_run: false,
            candidates: plan.candidates.iter().map(|c| c.name.clone()).collect(),
            moved: Vec::new(),
            failed_moves: Vec::new(),
            incomplete_batches: plan.incomplete.clone(),
            unmatched_directories: plan.unmatched.clone(),
            skipped_directories: plan.skipped.clone(),
            move_log_errors: 0,
        }
    }

    /// True when every candidate directory ended up in place.
    pub fn is_clean(&self) -> bool {
        self.failed_moves.is_empty()
            && self.incomplete_batches.is_empty()
            && self.unmatched_directories.is_empty()
            && self.skipped_directories.is_empty()
            && self.move_log_errors == 0
    }
}

/// Writes the summary as pretty-printed JSON.
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<(), SortError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| SortError::Config(format!("cannot serialize run summary: {e}")))?;
    fs::write(path, json + "\n")?;
    Ok(())
}

// ============================================================================
// Terminal Rendering
// ============================================================================

fn pass_label(direction: PassDirection) -> &'static str {
    match direction {
        PassDirection::Ascending => "ASCENDING",
        PassDirection::Descending => "DESCENDING",
    }
}

/// Plan shown before the confirmation prompt.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    out.push_str("These all appear to be valid directories for processing:\n");
    for c in &plan.candidates {
        out.push_str(&format!("  {}\n", c.name));
    }
    out.push_str("We are going to sort this into subdirectories:\n");
    for label in plan.sequence.labels() {
        out.push_str(&format!("  {}\n", label));
    }
    out.push_str(&format!(
        "This is {} data (site set '{}')\n",
        pass_label(plan.direction),
        plan.site_set.code
    ));

    if !plan.assignments.is_empty() {
        out.push_str(&format!("\nPlanned moves ({}):\n", plan.planned_moves()));
        for batch in &plan.assignments {
            for e in &batch.entries {
                out.push_str(&format!(
                    "  {} -> {}\n",
                    e.directory.name,
                    e.target_relative().display()
                ));
            }
        }
    }
    if !plan.incomplete.is_empty() {
        out.push_str(&format!("\nIncomplete batches, left in place ({}):\n", plan.incomplete.len()));
        for batch in &plan.incomplete {
            out.push_str(&format!("  {}\n", batch));
        }
    }
    if !plan.unmatched.is_empty() {
        out.push_str(&format!("\nNo image file found in: {}\n", plan.unmatched.join(", ")));
    }
    for skipped in &plan.skipped {
        out.push_str(&format!("Skipping {}: {}\n", skipped.directory, skipped.reason));
    }
    if !plan.missing_site_dirs.is_empty() {
        out.push_str(&format!(
            "\nWARNING: missing site directories under {}: {}\n",
            plan.root.display(),
            plan.missing_site_dirs.join(", ")
        ));
    }
    out
}

pub fn print_plan(plan: &Plan) {
    print!("{}", render_plan(plan));
}

pub fn print_summary(summary: &RunSummary) {
    let rule = "═".repeat(63);
    println!("\n{}", rule);
    println!("RUN SUMMARY{}", if summary.dry_run { " (dry run)" } else { "" });
    println!("{}", rule);
    println!();
    println!("Candidates:        {}", summary.candidates.len());
    println!("Moved:             {}", summary.moved.len());
    println!("Failed moves:      {}", summary.failed_moves.len());
    println!("Incomplete batches:{:>2}", summary.incomplete_batches.len());
    println!("No image file:     {}", summary.unmatched_directories.len());
    println!("Skipped:           {}", summary.skipped_directories.len());
    for failed in &summary.failed_moves {
        println!("  ✗ {}: {}", failed.directory, failed.reason);
    }
    if summary.move_log_errors > 0 {
        println!("Move log errors:   {}", summary.move_log_errors);
    }
    println!("{}", rule);
}
