/// Image filename timestamp extraction
///
/// A CSK scene directory holds one HDF5 product among its metadata files,
/// named for example
///
///   CSKS2_SCS_B_HI_0B_HH_RD_SF_20170803194620_20170803194626.h5
///
/// i.e. an arbitrary prefix, the acquisition start time, an underscore, the
/// acquisition stop time and a `.h5` suffix. Only the start time is used;
/// the stop time is checked for shape and otherwise ignored.
use regex::Regex;
use std::sync::LazyLock;

use crate::model::{BatchKey, ImageMatch, ImageTimestamp, SortError};

static IMAGE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(.*)          # CSKS2_SCS_B_HI_0B_HH_RD_SF_
        (\d{4})        # year
        (\d{2})        # month
        (\d{2})        # day
        (\d{2})        # hour
        (\d{2})        # minute
        (\d{2})        # second
        _\d{14}        # stop time
        \.h5$",
    )
    .expect("valid image filename regex")
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Parses one filename.
///
/// Returns `Ok(None)` for anything that is not a CSK image file; most files
/// in a scene directory are not. Returns `MalformedTimestamp` if the name has
/// the right shape but the start time is not a real date and time.
pub fn extract_image_timestamp(filename: &str) -> Result<Option<ImageMatch>, SortError> {
    let Some(caps) = IMAGE_FILENAME.captures(filename) else {
        return Ok(None);
    };

    let prefix = &caps[1];
    let (year, month, day) = (&caps[2], &caps[3], &caps[4]);
    let (hour, minute, second) = (&caps[5], &caps[6], &caps[7]);

    let malformed = |reason: String| SortError::MalformedTimestamp {
        filename: filename.to_string(),
        reason,
    };

    // `\d` also matches non-ASCII digits, which `parse` rejects.
    let number = |s: &str| s.parse::<u32>().map_err(|e| malformed(e.to_string()));
    let timestamp = ImageTimestamp::from_fields(
        number(year)? as i32,
        number(month)?,
        number(day)?,
        number(hour)?,
        number(minute)?,
        number(second)?,
    )
    .ok_or_else(|| {
        malformed(format!(
            "{year}-{month}-{day} {hour}:{minute}:{second} is not a valid date and time"
        ))
    })?;

    Ok(Some(ImageMatch {
        prefix: prefix.to_string(),
        key: BatchKey::new(prefix, year, month, day),
        timestamp,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
