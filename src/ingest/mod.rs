/// Directory and filename ingestion.
///
/// Submodules:
/// - `filename`: extracts the acquisition timestamp and batch key from an
///   image filename.
/// - `scan`: recognizes candidate scene directories and scans their files.

pub mod filename;
pub mod scan;
