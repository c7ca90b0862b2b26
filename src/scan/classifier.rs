//! Recognition of scanner default file names.
//!
//! The scanner app names files like `3_28_25, 12_51 PM Microsoft Lens.jpg`,
//! sometimes with a narrow no-break space before `PM` and a `(1)` counter
//! after the app name when the same minute is used twice.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Default-name pattern: month, day, year, hour, minute, meridiem, extension.
static SCAN_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})_(\d{1,2})_(\d{1,2}),?\s+(\d{1,2})_(\d{2})\s*(AM|PM)\s*Microsoft Lens(?:\s*\(\d+\))?\.(jpg|jpeg|png|pdf)$",
    )
    .expect("scan name pattern is valid")
});

/// Parts of a recognized scanner file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanName {
    /// Capture time encoded in the name (minute resolution).
    pub captured_at: NaiveDateTime,
    /// Lower-case extension.
    pub extension: String,
}

/// Classify a file name.
///
/// Returns `None` when the name does not follow the scanner convention or
/// encodes an impossible date or time.
#[must_use]
pub fn classify(file_name: &str) -> Option<ScanName> {
    let caps = SCAN_NAME_PATTERN.captures(file_name)?;
    let captured_at = parse_timestamp(&caps)?;
    let extension = caps.get(7)?.as_str().to_lowercase();

    Some(ScanName {
        captured_at,
        extension,
    })
}

/// Whether a file name follows the scanner convention.
#[must_use]
pub fn is_scan_name(file_name: &str) -> bool {
    classify(file_name).is_some()
}

fn parse_timestamp(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

    let month = field(1)?;
    let day = field(2)?;
    let year = i32::try_from(field(3)?).ok()? + 2000;
    let hour12 = field(4)?;
    let minute = field(5)?;

    if !(1..=12).contains(&hour12) {
        return None;
    }
    let pm = caps.get(6)?.as_str().eq_ignore_ascii_case("pm");
    let hour = match (hour12, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
