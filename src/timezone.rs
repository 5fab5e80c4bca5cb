//! Conversions from canonical timezone names, e.g. "Pacific/Auckland", to UTC offsets.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, timezones};

use crate::Error;

/// The offset from UTC of `canonical_timezone` right now, or `None` if the
/// name is not a known timezone.
///
/// The offset follows daylight saving, so it is looked up on every call.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Check that `canonical_timezone` names a known timezone.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] with the name if it is unknown.
pub fn check_timezone(canonical_timezone: &str) -> Result<(), Error> {
    match timezones::get_by_name(canonical_timezone) {
        Some(_) => Ok(()),
        None => Err(Error::InvalidTimezoneError(canonical_timezone.to_owned())),
    }
}
