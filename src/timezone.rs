//! Conversions between UTC instants and the user's local calendar day.

use time::{OffsetDateTime, Time, UtcOffset, macros::time};
use time_tz::{Offset, TimeZone};

/// Get the UTC offset of `canonical_timezone` (e.g. "Asia/Kolkata") right now.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    get_offset_at(canonical_timezone, OffsetDateTime::now_utc())
}

/// Get the UTC offset of `canonical_timezone` at the instant `at`.
pub fn get_offset_at(canonical_timezone: &str, at: OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&at).to_utc())
}

/// The last representable millisecond of a day.
const END_OF_DAY: Time = time!(23:59:59.999);

/// The closed interval `[local midnight, local 23:59:59.999]` of the calendar
/// day containing `now`, expressed in UTC.
pub fn local_day_bounds(
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> (OffsetDateTime, OffsetDateTime) {
    let local_now = now.to_offset(local_offset);
    let start = local_now.replace_time(Time::MIDNIGHT);
    let end = local_now.replace_time(END_OF_DAY);

    (start.to_offset(UtcOffset::UTC), end.to_offset(UtcOffset::UTC))
}
