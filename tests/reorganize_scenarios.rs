/// End-to-end sorting scenarios against an in-memory store
///
/// Tests verify:
/// 1. Triads are assigned to sites by acquisition order and pass direction
/// 2. Nothing is touched unless the operator confirms
/// 3. Incomplete batches, malformed names and failed moves are isolated
/// 4. Non-candidate directories never show up in diagnostics
///
/// No real filesystem is involved; see `local_store.rs` for that.
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use csk_sorter::model::PassDirection;
use csk_sorter::{DryRunStore, Plan, Reorganizer, RunOutcome, SceneStore, SortError, find_site_set};

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryStore {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<String>>,
    logs: BTreeMap<PathBuf, Vec<String>>,
    moves: Vec<(PathBuf, PathBuf)>,
}

impl MemoryStore {
    fn with_dir(mut self, path: &str) -> Self {
        self.dirs.insert(PathBuf::from(path));
        self
    }

    fn with_file(mut self, dir: &str, name: &str) -> Self {
        let dir = PathBuf::from(dir);
        self.dirs.insert(dir.clone());
        self.files.entry(dir).or_default().push(name.to_string());
        self
    }

    fn log_lines(&self, log: &Path) -> Vec<String> {
        self.logs.get(log).cloned().unwrap_or_default()
    }
}

impl SceneStore for MemoryStore {
    fn list_subdirectories(&self, dir: &Path) -> io::Result<Vec<String>> {
        if !self.dirs.contains(dir) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        Ok(self
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(dir))
            .filter_map(|d| d.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect())
    }

    fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = self.list_subdirectories(dir)?;
        entries.extend(self.files.get(dir).cloned().unwrap_or_default());
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.logs.contains_key(path)
    }

    fn move_dir(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        if !self.dirs.contains(from) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "source not found"));
        }
        if !to.parent().is_some_and(|p| self.dirs.contains(p)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"));
        }
        if self.exists(to) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"));
        }
        self.dirs.remove(from);
        self.dirs.insert(to.to_path_buf());
        if let Some(files) = self.files.remove(from) {
            self.files.insert(to.to_path_buf(), files);
        }
        self.moves.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn append_log(&mut self, log: &Path, line: &str) -> io::Result<()> {
        self.logs.entry(log.to_path_buf()).or_default().push(line.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const ROOT: &str = "/scenes";

fn site_dirs(store: MemoryStore, labels: &[&str]) -> MemoryStore {
    labels
        .iter()
        .fold(store.with_dir(ROOT), |s, l| s.with_dir(&format!("{ROOT}/{l}")))
}

/// One overflight on 2017-08-03 where later variant ids hold earlier
/// acquisitions.
fn triad_files(store: MemoryStore) -> MemoryStore {
    store
        .with_file("/scenes/100001-11111", "X_20170803194640_20170803194646.h5")
        .with_file("/scenes/100001-11111", "X_20170803194640_20170803194646.xml")
        .with_file("/scenes/100001-11112", "X_20170803194630_20170803194636.h5")
        .with_file("/scenes/100001-11113", "X_20170803194620_20170803194626.h5")
}

fn triad_store() -> MemoryStore {
    triad_files(site_dirs(MemoryStore::default(), &["Eyja", "Tind", "Hekla"]))
}

fn reorganizer(store: MemoryStore) -> Reorganizer<MemoryStore> {
    Reorganizer::new(ROOT, store)
}

fn run_confirmed(
    reorganizer: &mut Reorganizer<MemoryStore>,
    direction: PassDirection,
    code: &str,
) -> csk_sorter::report::RunSummary {
    let site_set = find_site_set(code, &[]).unwrap();
    match reorganizer.run(direction, &site_set, |_| true) {
        Ok(RunOutcome::Completed(summary)) => summary,
        other => panic!("expected a completed run, got {:?}", other),
    }
}

fn moves(store: &MemoryStore) -> Vec<(String, String)> {
    store
        .moves
        .iter()
        .map(|(f, t)| (f.display().to_string(), t.display().to_string()))
        .collect()
}

fn pair(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

// ---------------------------------------------------------------------------
// Assignment scenarios
// ---------------------------------------------------------------------------

#[test]
fn ascending_eth_maps_earliest_to_eyja() {
    let mut r = reorganizer(triad_store());
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(
        moves(r.store()),
        vec![
            pair("/scenes/100001-11113", "/scenes/Eyja/20170803_Eyja"),
            pair("/scenes/100001-11112", "/scenes/Tind/20170803_Tind"),
            pair("/scenes/100001-11111", "/scenes/Hekla/20170803_Hekla"),
        ]
    );
    assert_eq!(summary.moved.len(), 3);
    assert!(summary.is_clean());
}

#[test]
fn descending_eth_maps_earliest_to_hekla() {
    let mut r = reorganizer(triad_store());
    run_confirmed(&mut r, PassDirection::Descending, "eth");

    assert_eq!(
        moves(r.store()),
        vec![
            pair("/scenes/100001-11113", "/scenes/Hekla/20170803_Hekla"),
            pair("/scenes/100001-11112", "/scenes/Tind/20170803_Tind"),
            pair("/scenes/100001-11111", "/scenes/Eyja/20170803_Eyja"),
        ]
    );
}

#[test]
fn nms_site_set_uses_nth_mid_sth() {
    let store = site_dirs(MemoryStore::default(), &["nth", "mid", "sth"])
        .with_file("/scenes/140578-23790", "CSKS2_SCS_B_HI_0B_HH_RD_SF_20180110063010_20180110063017.h5")
        .with_file("/scenes/140578-23791", "CSKS2_SCS_B_HI_0B_HH_RD_SF_20180110063020_20180110063027.h5")
        .with_file("/scenes/140578-23796", "CSKS2_SCS_B_HI_0B_HH_RD_SF_20180110063030_20180110063037.h5");
    let mut r = reorganizer(store);
    run_confirmed(&mut r, PassDirection::Ascending, "nms");

    assert_eq!(
        moves(r.store()),
        vec![
            pair("/scenes/140578-23790", "/scenes/nth/20180110_nth"),
            pair("/scenes/140578-23791", "/scenes/mid/20180110_mid"),
            pair("/scenes/140578-23796", "/scenes/sth/20180110_sth"),
        ]
    );
}

#[test]
fn every_move_is_recorded_in_the_move_log() {
    let mut r = reorganizer(triad_store());
    run_confirmed(&mut r, PassDirection::Ascending, "eth");

    let lines = r.store().log_lines(Path::new("/scenes/sorted.txt"));
    assert_eq!(
        lines,
        vec![
            "Moved directory /scenes/100001-11113 to /scenes/Eyja/20170803_Eyja",
            "Moved directory /scenes/100001-11112 to /scenes/Tind/20170803_Tind",
            "Moved directory /scenes/100001-11111 to /scenes/Hekla/20170803_Hekla",
        ]
    );
}

#[test]
fn custom_move_log_name_is_honoured() {
    let mut r = reorganizer(triad_store()).with_move_log_name("moves.txt");
    run_confirmed(&mut r, PassDirection::Ascending, "eth");
    assert_eq!(r.store().log_lines(Path::new("/scenes/moves.txt")).len(), 3);
    assert!(r.store().log_lines(Path::new("/scenes/sorted.txt")).is_empty());
}

#[test]
fn two_overflights_are_sorted_independently() {
    let store = triad_store()
        .with_file("/scenes/100002-21111", "X_20170905194620_20170905194626.h5")
        .with_file("/scenes/100002-21112", "X_20170905194600_20170905194606.h5")
        .with_file("/scenes/100002-21113", "X_20170905194640_20170905194646.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.moved.len(), 6);
    let second: Vec<_> = moves(r.store()).into_iter().skip(3).collect();
    assert_eq!(
        second,
        vec![
            pair("/scenes/100002-21112", "/scenes/Eyja/20170905_Eyja"),
            pair("/scenes/100002-21111", "/scenes/Tind/20170905_Tind"),
            pair("/scenes/100002-21113", "/scenes/Hekla/20170905_Hekla"),
        ]
    );
}

// ---------------------------------------------------------------------------
// Confirmation gate
// ---------------------------------------------------------------------------

#[test]
fn declining_changes_nothing() {
    let mut r = reorganizer(triad_store());
    let site_set = find_site_set("eth", &[]).unwrap();
    let mut seen: Option<usize> = None;

    let outcome = r
        .run(PassDirection::Ascending, &site_set, |plan: &Plan| {
            seen = Some(plan.planned_moves());
            false
        })
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Declined(_)));
    assert_eq!(seen, Some(3), "operator should be shown the full plan");
    assert!(r.store().moves.is_empty());
    assert!(r.store().logs.is_empty());
}

#[test]
fn plan_shows_candidates_and_sequence_before_confirmation() {
    let mut r = reorganizer(triad_store());
    let site_set = find_site_set("eth", &[]).unwrap();
    let mut shown = Vec::new();

    r.run(PassDirection::Descending, &site_set, |plan: &Plan| {
        shown = plan.candidates.iter().map(|c| c.name.clone()).collect();
        assert_eq!(plan.sequence.labels(), ["Hekla", "Tind", "Eyja"]);
        true
    })
    .unwrap();

    assert_eq!(shown, vec!["100001-11111", "100001-11112", "100001-11113"]);
}

// ---------------------------------------------------------------------------
// Isolated failures
// ---------------------------------------------------------------------------

#[test]
fn incomplete_batch_is_reported_and_skipped() {
    let store = triad_store()
        .with_file("/scenes/100002-21111", "X_20170905194620_20170905194626.h5")
        .with_file("/scenes/100002-21112", "X_20170905194600_20170905194606.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.moved.len(), 3);
    assert_eq!(summary.incomplete_batches.len(), 1);
    let batch = &summary.incomplete_batches[0];
    assert_eq!(batch.count, 2);
    assert_eq!(batch.members, vec!["100002-21111", "100002-21112"]);
    assert!(r.store().is_dir(Path::new("/scenes/100002-21111")));
    assert!(r.store().is_dir(Path::new("/scenes/100002-21112")));
}

#[test]
fn over_full_batch_is_reported_with_its_count() {
    let store = triad_store().with_file("/scenes/100001-11114", "X_20170803194700_20170803194706.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.incomplete_batches.len(), 1);
    assert_eq!(summary.incomplete_batches[0].count, 4);
    assert!(summary.moved.is_empty());
    assert!(r.store().moves.is_empty());
}

#[test]
fn acquisitions_on_different_days_never_form_a_triad() {
    let store = site_dirs(MemoryStore::default(), &["Eyja", "Tind", "Hekla"])
        .with_file("/scenes/100001-11111", "X_20170803194620_20170803194626.h5")
        .with_file("/scenes/100001-11112", "X_20170802194620_20170802194626.h5")
        .with_file("/scenes/100001-11113", "X_20170801194620_20170801194626.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    let keys: Vec<&str> = summary.incomplete_batches.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["X_20170801", "X_20170802", "X_20170803"]);
    assert!(summary.incomplete_batches.iter().all(|b| b.count == 1));
    assert!(r.store().moves.is_empty());
}

#[test]
fn repeated_directory_never_fills_a_triad() {
    let store = site_dirs(MemoryStore::default(), &["Eyja", "Tind", "Hekla"])
        .with_file("/scenes/100001-11111", "X_20170803194620_20170803194626.h5")
        .with_file("/scenes/100001-11111", "X_20170803194640_20170803194646.h5")
        .with_file("/scenes/100001-11111", "Y_20170803194620_20170803194626.h5")
        .with_file("/scenes/100001-11112", "X_20170803194630_20170803194636.h5")
        .with_dir("/scenes/100001-11113");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert!(summary.moved.is_empty());
    assert!(summary.failed_moves.is_empty());
    assert!(r.store().moves.is_empty());
    assert!(r.store().log_lines(Path::new("/scenes/sorted.txt")).is_empty());

    let shared_day = &summary.incomplete_batches[0];
    assert_eq!(shared_day.key.as_str(), "X_20170803");
    assert_eq!(shared_day.count, 2);
    assert_eq!(shared_day.images, 3);
    assert_eq!(shared_day.members, vec!["100001-11111", "100001-11112"]);
    assert_eq!(summary.incomplete_batches[1].key.as_str(), "Y_20170803");
    assert_eq!(summary.unmatched_directories, vec!["100001-11113"]);
}

#[test]
fn malformed_timestamp_skips_only_that_directory() {
    let store = triad_store().with_file("/scenes/100009-99999", "X_20171345194620_20171345194626.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.moved.len(), 3);
    assert_eq!(summary.skipped_directories.len(), 1);
    assert_eq!(summary.skipped_directories[0].directory, "100009-99999");
    assert!(summary.skipped_directories[0].reason.contains("malformed timestamp"));
    assert!(summary.incomplete_batches.is_empty());
}

#[test]
fn directory_without_image_is_unmatched() {
    let store = triad_store().with_file("/scenes/100009-99998", "README.txt");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.unmatched_directories, vec!["100009-99998"]);
    assert_eq!(summary.moved.len(), 3);
    assert!(r.store().is_dir(Path::new("/scenes/100009-99998")));
}

#[test]
fn missing_site_directory_fails_only_its_own_move() {
    let store = triad_files(site_dirs(MemoryStore::default(), &["Eyja", "Tind"]));
    let mut r = reorganizer(store);
    let site_set = find_site_set("eth", &[]).unwrap();

    let mut missing = Vec::new();
    let outcome = r
        .run(PassDirection::Ascending, &site_set, |plan: &Plan| {
            missing = plan.missing_site_dirs.clone();
            true
        })
        .unwrap();
    let RunOutcome::Completed(summary) = outcome else {
        panic!("run should complete");
    };

    assert_eq!(missing, vec!["Hekla"]);
    assert_eq!(summary.moved.len(), 2);
    assert_eq!(summary.failed_moves.len(), 1);
    let failed = &summary.failed_moves[0];
    assert_eq!(failed.directory, "100001-11111");
    assert_eq!(failed.to, "/scenes/Hekla/20170803_Hekla");
    assert!(failed.reason.contains("/scenes/Hekla/20170803_Hekla"));
    assert_eq!(r.store().log_lines(Path::new("/scenes/sorted.txt")).len(), 2);
    assert!(r.store().is_dir(Path::new("/scenes/100001-11111")));
}

#[test]
fn existing_destination_is_not_overwritten() {
    let store = triad_store().with_dir("/scenes/Tind/20170803_Tind");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    assert_eq!(summary.moved.len(), 2);
    assert_eq!(summary.failed_moves.len(), 1);
    assert!(summary.failed_moves[0].reason.contains("already exists"));
}

// ---------------------------------------------------------------------------
// Candidate filtering
// ---------------------------------------------------------------------------

#[test]
fn non_candidate_directories_never_appear() {
    let store = triad_store()
        .with_file("/scenes/tmp_backup", "X_20170801194620_20170801194626.h5")
        .with_file("/scenes/100001-1111", "X_20170801194620_20170801194626.h5");
    let mut r = reorganizer(store);
    let summary = run_confirmed(&mut r, PassDirection::Ascending, "eth");

    let mentioned: Vec<&String> = summary
        .candidates
        .iter()
        .chain(summary.unmatched_directories.iter())
        .chain(summary.skipped_directories.iter().map(|s| &s.directory))
        .chain(summary.incomplete_batches.iter().flat_map(|b| b.members.iter()))
        .collect();
    assert!(!mentioned.iter().any(|n| n.as_str() == "tmp_backup"));
    assert!(!mentioned.iter().any(|n| n.as_str() == "100001-1111"));
    assert_eq!(summary.moved.len(), 3);
    assert!(summary.is_clean());
}

#[test]
fn no_candidates_is_fatal() {
    let store = site_dirs(MemoryStore::default(), &["Eyja", "Tind", "Hekla"]).with_dir("/scenes/tmp_backup");
    let mut r = reorganizer(store);
    let site_set = find_site_set("eth", &[]).unwrap();
    let mut asked = false;

    let result = r.run(PassDirection::Ascending, &site_set, |_| {
        asked = true;
        true
    });

    assert!(matches!(result, Err(SortError::NoCandidateDirectories(_))));
    assert!(!asked, "operator must not be prompted when there is nothing to do");
}

#[test]
fn missing_working_directory_is_an_io_error() {
    let mut r = Reorganizer::new("/nowhere", MemoryStore::default());
    let site_set = find_site_set("eth", &[]).unwrap();
    let result = r.run(PassDirection::Ascending, &site_set, |_| true);
    assert!(matches!(result, Err(SortError::Io(_))));
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_rehearses_without_moving() {
    let mut r = Reorganizer::new(ROOT, DryRunStore::new(triad_store()));
    let site_set = find_site_set("eth", &[]).unwrap();
    let outcome = r.run(PassDirection::Ascending, &site_set, |_| true).unwrap();
    let RunOutcome::Completed(summary) = outcome else {
        panic!("dry run should complete");
    };

    assert_eq!(summary.moved.len(), 3);
    let dry = r.into_store();
    assert_eq!(dry.rehearsed_moves().len(), 3);
    let inner = dry.into_inner();
    assert!(inner.moves.is_empty());
    assert!(inner.logs.is_empty());
    assert!(inner.is_dir(Path::new("/scenes/100001-11111")));
}
