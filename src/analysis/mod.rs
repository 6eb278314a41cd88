/// Grouping and ordering of scanned scenes.
///
/// This module holds the sorting logic proper; it performs no I/O.
///
/// Submodules:
/// - `groupings`: clusters scanned directories into overflights by batch key.
/// - `ordering`: orders each triad chronologically and pairs it with site labels.

pub mod groupings;
pub mod ordering;
