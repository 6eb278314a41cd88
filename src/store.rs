//! Filesystem capability used by the reorganizer.
//!
//! All listing, moving and log appends go through `SceneStore` so the
//! grouping and assignment logic can run against an in-memory store in
//! tests. `LocalStore` is the real thing; `DryRunStore` wraps any store,
//! delegating reads and only reporting mutations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::logging::{self, Stage};

pub trait SceneStore {
    /// Names of the subdirectories directly under `dir`.
    fn list_subdirectories(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Names of all entries directly under `dir`.
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn is_dir(&self, path: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool;

    /// Moves a directory. Must not create missing parents of `to`.
    fn move_dir(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Appends one line to the log at `log`, creating the file if needed.
    fn append_log(&mut self, log: &Path, line: &str) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl SceneStore for LocalStore {
    fn list_subdirectories(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Follows symlinks; a dangling link is not a directory.
            if !fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
                continue;
            }
            // Non-UTF-8 names can never be candidates.
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn move_dir(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        // rename(2) onto an existing empty directory succeeds on Linux;
        // refuse instead so nothing is ever replaced.
        if to.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                logging::debug(
                    Stage::Move,
                    None,
                    &format!("{} is on another filesystem; copying instead", to.display()),
                );
                move_across_devices(from, to)
            }
            result => result,
        }
    }

    fn append_log(&mut self, log: &Path, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(log)?;
        // One write per record keeps each append atomic.
        file.write_all(format!("{line}\n").as_bytes())
    }
}

/// Copies `from` to `to`, then removes `from`. A failed copy removes the
/// partial destination and leaves the source as it was.
fn move_across_devices(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(from)?.file_type().is_symlink() {
        copy_link(from, to)?;
        return fs::remove_file(from);
    }
    fs::create_dir(to)?;
    if let Err(e) = copy_entries(from, to) {
        let _ = fs::remove_dir_all(to);
        return Err(e);
    }
    fs::remove_dir_all(from)
}

/// Copies the contents of `from` into the existing directory `to`.
fn copy_entries(from: &Path, to: &Path) -> io::Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = to.join(entry.file_name());
        if file_type.is_symlink() {
            copy_link(&entry.path(), &dest)?;
        } else if file_type.is_dir() {
            fs::create_dir(&dest)?;
            copy_entries(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_link(from: &Path, _to: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot copy symlink {} across filesystems", from.display()),
    ))
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Wraps a store so a run can be rehearsed without changing anything.
#[derive(Debug, Default)]
pub struct DryRunStore<S> {
    inner: S,
    moves: Vec<(String, String)>,
}

impl<S: SceneStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        DryRunStore {
            inner,
            moves: Vec::new(),
        }
    }

    /// Moves that would have been performed, as `(from, to)` display strings.
    pub fn rehearsed_moves(&self) -> &[(String, String)] {
        &self.moves
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SceneStore> SceneStore for DryRunStore<S> {
    fn list_subdirectories(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.inner.list_subdirectories(dir)
    }

    fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.inner.list_entries(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    /// Applies the same preconditions as a real move so a rehearsal reports
    /// the failures a real run would hit.
    fn move_dir(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        if !self.inner.is_dir(from) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "source directory not found"));
        }
        match to.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.inner.is_dir(parent) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "destination parent directory not found",
                ));
            }
            _ => {}
        }
        if self.inner.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }
        let (from, to) = (from.display().to_string(), to.display().to_string());
        logging::info(Stage::Move, None, &format!("Would move {} to {}", from, to));
        self.moves.push((from, to));
        Ok(())
    }

    fn append_log(&mut self, log: &Path, line: &str) -> io::Result<()> {
        logging::debug(
            Stage::Move,
            None,
            &format!("Would append to {}: {}", log.display(), line),
        );
        Ok(())
    }
}
