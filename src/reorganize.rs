//! Reorganizer: drives one sorting run from directory listing to moves.
//!
//! A run has four phases:
//!   1. discover candidate directories in the working directory,
//!   2. scan each one for its image file and group the results by batch key,
//!   3. plan site assignments for every complete triad,
//!   4. after the operator confirms, move each directory into place and
//!      record the move in the append-only move log.
//!
//! Nothing is mutated before the confirmation gate returns `true`. Per-file,
//! per-batch and per-move problems are logged and skipped; only a missing or
//! unreadable working directory aborts the run.

use std::path::PathBuf;

use crate::analysis::groupings::BatchGrouper;
use crate::analysis::ordering::plan_assignments;
use crate::ingest::scan::{DirectoryScan, scan_directory_files, select_candidates};
use crate::logging::{self, Stage};
use crate::model::{
    BatchAssignment, CandidateDirectory, DEFAULT_MOVE_LOG, IncompleteBatch, PassDirection, SortError,
};
use crate::report::{FailedMove, MoveRecord, RunSummary, SkippedDirectory};
use crate::sites::{SiteSequence, SiteSet};
use crate::store::SceneStore;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Result of scanning every candidate directory.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub grouper: BatchGrouper,
    /// Directories without any image file.
    pub unmatched: Vec<CandidateDirectory>,
    /// Directories skipped because of a malformed image name or a listing
    /// error.
    pub skipped: Vec<SkippedDirectory>,
}

/// Everything the operator is shown before confirming.
#[derive(Debug, Clone)]
pub struct Plan {
    pub root: PathBuf,
    pub direction: PassDirection,
    pub site_set: SiteSet,
    pub sequence: SiteSequence,
    pub candidates: Vec<CandidateDirectory>,
    pub assignments: Vec<BatchAssignment>,
    pub incomplete: Vec<IncompleteBatch>,
    pub unmatched: Vec<String>,
    pub skipped: Vec<SkippedDirectory>,
    /// Site folders that do not exist under the root. Moves into them will
    /// fail; they are not created.
    pub missing_site_dirs: Vec<String>,
}

impl Plan {
    pub fn planned_moves(&self) -> usize {
        self.assignments.iter().map(|a| a.entries.len()).sum()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The operator did not confirm. Nothing was changed.
    Declined(Plan),
    Completed(RunSummary),
}

/// Whether an operator reply means "go ahead": its first non-blank
/// character is `y` or `Y`.
pub fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim_start().chars().next(), Some('y' | 'Y'))
}

// ---------------------------------------------------------------------------
// Reorganizer
// ---------------------------------------------------------------------------

pub struct Reorganizer<S> {
    root: PathBuf,
    store: S,
    move_log: PathBuf,
}

impl<S: SceneStore> Reorganizer<S> {
    pub fn new(root: impl Into<PathBuf>, store: S) -> Self {
        let root = root.into();
        let move_log = root.join(DEFAULT_MOVE_LOG);
        Reorganizer {
            root,
            store,
            move_log,
        }
    }

    /// Uses `name` (a file in the working directory) as the move log.
    pub fn with_move_log_name(mut self, name: &str) -> Self {
        self.move_log = self.root.join(name);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Candidate directories under the root, sorted by name.
    pub fn discover(&self) -> Result<Vec<CandidateDirectory>, SortError> {
        let names = self.store.list_subdirectories(&self.root)?;
        let candidates = select_candidates(names);
        if candidates.is_empty() {
            return Err(SortError::NoCandidateDirectories(self.root.clone()));
        }
        Ok(candidates)
    }

    /// Scans every candidate for its image file and groups the results.
    pub fn scan(&self, candidates: &[CandidateDirectory]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for candidate in candidates {
            let name = candidate.name.as_str();
            logging::info(
                Stage::Scan,
                None,
                &format!("Checking directory {} for image file...", name),
            );

            let files = match self.store.list_entries(&self.root.join(name)) {
                Ok(files) => files,
                Err(e) => {
                    logging::warn(Stage::Scan, Some(name), &format!("cannot list directory: {}", e));
                    outcome.skipped.push(SkippedDirectory {
                        directory: name.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match scan_directory_files(files) {
                DirectoryScan::Images(images) => {
                    if images.len() > 1 {
                        logging::warn(
                            Stage::Scan,
                            Some(name),
                            &format!("{} image files found where one is expected", images.len()),
                        );
                    }
                    for (filename, image) in images {
                        logging::info(Stage::Scan, Some(name), &format!("Found image file {}", filename));
                        outcome.grouper.add(candidate.clone(), image.key, image.timestamp);
                    }
                }
                DirectoryScan::NoImage => {
                    logging::warn(Stage::Scan, Some(name), "no image file found; directory left in place");
                    outcome.unmatched.push(candidate.clone());
                }
                DirectoryScan::Malformed(e) => {
                    logging::warn(Stage::Scan, Some(name), &format!("skipping directory: {}", e));
                    outcome.skipped.push(SkippedDirectory {
                        directory: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    /// Discovers, scans and assigns without touching the filesystem.
    pub fn plan(&self, direction: PassDirection, site_set: &SiteSet) -> Result<Plan, SortError> {
        let sequence = SiteSequence::for_pass(&site_set.labels, direction)?;
        let candidates = self.discover()?;
        let ScanOutcome {
            grouper,
            unmatched,
            skipped,
        } = self.scan(&candidates);

        logging::debug(
            Stage::Group,
            None,
            &format!("{} batch key(s) from {} directories", grouper.len(), candidates.len()),
        );
        let (assignments, incomplete) = plan_assignments(&grouper, &sequence);
        for batch in &incomplete {
            logging::warn(Stage::Group, Some(batch.key.as_str()), &format!("{}; skipping these", batch));
        }

        let missing_site_dirs: Vec<String> = sequence
            .labels()
            .iter()
            .filter(|label| !self.store.is_dir(&self.root.join(label.as_str())))
            .cloned()
            .collect();
        for label in &missing_site_dirs {
            logging::warn(
                Stage::Plan,
                Some(label.as_str()),
                "site directory does not exist; moves into it will fail",
            );
        }

        Ok(Plan {
            root: self.root.clone(),
            direction,
            site_set: site_set.clone(),
            sequence,
            candidates,
            assignments,
            incomplete,
            unmatched: unmatched.into_iter().map(|c| c.name).collect(),
            skipped,
            missing_site_dirs,
        })
    }

    /// Performs every planned move, continuing past individual failures.
    pub fn execute(&mut self, plan: &Plan) -> RunSummary {
        let mut summary = RunSummary::from_plan(plan);

        for batch in &plan.assignments {
            logging::info(Stage::Move, None, &format!("Checking batch with prefix {}", batch.key));

            for entry in &batch.entries {
                let name = entry.directory.name.as_str();
                logging::info(
                    Stage::Move,
                    Some(name),
                    &format!("{} (datestamp {}) is for {}", name, entry.timestamp, entry.site),
                );

                let from = self.root.join(name);
                let to = self.root.join(entry.target_relative());
                match self.store.move_dir(&from, &to) {
                    Ok(()) => {
                        let line = format!("Moved directory {} to {}", from.display(), to.display());
                        logging::info(Stage::Move, Some(name), &line);
                        if let Err(e) = self.store.append_log(&self.move_log, &line) {
                            logging::error(
                                Stage::Move,
                                Some(name),
                                &format!("could not record move in {}: {}", self.move_log.display(), e),
                            );
                            summary.move_log_errors += 1;
                        }
                        summary.moved.push(MoveRecord {
                            directory: name.to_string(),
                            site: entry.site.clone(),
                            date: entry.date.clone(),
                            from: from.display().to_string(),
                            to: to.display().to_string(),
                        });
                    }
                    Err(source) => {
                        let kind = source.kind();
                        let (from_display, to_display) =
                            (from.display().to_string(), to.display().to_string());
                        let reason = SortError::MoveFailed { from, to, source }.to_string();
                        logging::log_move_failure(name, kind, &reason);
                        summary.failed_moves.push(FailedMove {
                            directory: name.to_string(),
                            from: from_display,
                            to: to_display,
                            reason,
                        });
                    }
                }
            }
        }

        logging::log_run_summary(
            plan.planned_moves(),
            summary.moved.len(),
            summary.failed_moves.len(),
            plan.incomplete.len(),
        );
        summary
    }

    /// Full run: plan, ask `confirm`, then execute.
    pub fn run<F>(
        &mut self,
        direction: PassDirection,
        site_set: &SiteSet,
        mut confirm: F,
    ) -> Result<RunOutcome, SortError>
    where
        F: FnMut(&Plan) -> bool,
    {
        let plan = self.plan(direction, site_set)?;
        if !confirm(&plan) {
            logging::info(Stage::System, None, "Not confirmed; nothing was changed.");
            return Ok(RunOutcome::Declined(plan));
        }
        Ok(RunOutcome::Completed(self.execute(&plan)))
    }
}
