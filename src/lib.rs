//! Sorts downloaded COSMO-SkyMed scene directories into the
//! `<site>/<YYYYMMDD>_<site>` layout expected by the processing pipeline.
//!
//! Each order arrives as three directories `NNNNNN-XXXXX`, one per site,
//! each holding an HDF5 image whose name carries the acquisition time. The
//! sorter groups the directories by overflight, orders each triad by
//! acquisition time and maps that order to site labels by pass direction.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod reorganize;
pub mod report;
pub mod sites;
pub mod store;

pub use model::{PassDirection, SortError};
pub use reorganize::{Plan, Reorganizer, RunOutcome, is_affirmative};
pub use sites::{SiteSequence, SiteSet, find_site_set};
pub use store::{DryRunStore, LocalStore, SceneStore};
