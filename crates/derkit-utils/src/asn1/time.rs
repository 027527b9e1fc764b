//! UTCTime / GeneralizedTime conversion to and from UNIX timestamps.

use super::StringKind;
use derkit_types::Asn1Error;

/// Parse the contents of a UTCTime or GeneralizedTime as a UNIX timestamp.
pub fn parse_time(kind: StringKind, bytes: &[u8]) -> Result<i64, Asn1Error> {
    let s = std::str::from_utf8(bytes).map_err(|_| Asn1Error::malformed("time is not ASCII"))?;
    match kind {
        StringKind::UtcTime => parse_utc_time(s),
        StringKind::GeneralizedTime => parse_generalized_time(s),
        _ => Err(Asn1Error::TypeMismatch("time")),
    }
}

fn digits(s: &str, range: std::ops::Range<usize>) -> Result<u32, Asn1Error> {
    let part = s
        .get(range)
        .ok_or_else(|| Asn1Error::malformed("time too short"))?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Asn1Error::malformed(format!("non-digit in time field {part:?}")));
    }
    part.parse()
        .map_err(|_| Asn1Error::malformed("time field out of range"))
}

/// "YYMMDDHHMMSSZ"; RFC 5280: 00-49 → 2000-2049, 50-99 → 1950-1999.
fn parse_utc_time(s: &str) -> Result<i64, Asn1Error> {
    let s = s
        .strip_suffix('Z')
        .ok_or_else(|| Asn1Error::malformed("UTCTime must end in Z"))?;
    if s.len() != 12 {
        return Err(Asn1Error::malformed("UTCTime must carry seconds"));
    }
    let yy = digits(s, 0..2)?;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    datetime_to_unix(
        year,
        digits(s, 2..4)?,
        digits(s, 4..6)?,
        digits(s, 6..8)?,
        digits(s, 8..10)?,
        digits(s, 10..12)?,
    )
}

/// "YYYYMMDDHHMMSS[.fff]Z"; fractional seconds are truncated.
fn parse_generalized_time(s: &str) -> Result<i64, Asn1Error> {
    let s = s
        .strip_suffix('Z')
        .ok_or_else(|| Asn1Error::malformed("GeneralizedTime must end in Z"))?;
    let s = s.split_once('.').map_or(s, |(whole, _)| whole);
    if s.len() != 14 {
        return Err(Asn1Error::malformed("GeneralizedTime must carry seconds"));
    }
    datetime_to_unix(
        digits(s, 0..4)?,
        digits(s, 4..6)?,
        digits(s, 6..8)?,
        digits(s, 8..10)?,
        digits(s, 10..12)?,
        digits(s, 12..14)?,
    )
}

/// Convert a date-time to a UNIX timestamp (seconds since 1970-01-01 00:00:00 UTC).
pub fn datetime_to_unix(
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> Result<i64, Asn1Error> {
    if year == 0
        || !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
        || hour > 23
        || min > 59
        || sec > 60
    {
        return Err(Asn1Error::malformed("time field out of range"));
    }
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 { month + 9 } else { month - 3 } as i64;
    let days = 365 * y + y / 4 - y / 100 + y / 400 + (m * 306 + 5) / 10 + (day as i64 - 1)
        - 719468;
    Ok(days * 86400 + hour as i64 * 3600 + min as i64 * 60 + sec as i64)
}

/// Convert a UNIX timestamp to date-time components.
fn unix_to_datetime(timestamp: i64) -> (i64, u32, u32, u32, u32, u32) {
    let days = timestamp.div_euclid(86400);
    let day_secs = timestamp.rem_euclid(86400) as u32;
    let hour = day_secs / 3600;
    let minute = (day_secs % 3600) / 60;
    let second = day_secs % 60;

    // Civil date from days since epoch (Howard Hinnant's algorithm)
    let days = days + 719468;
    let era = days.div_euclid(146097);
    let doe = (days - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };

    (year, m, d, hour, minute, second)
}

/// Format a UNIX timestamp as UTCTime "YYMMDDHHMMSSZ".
pub fn format_utc_time(timestamp: i64) -> String {
    let (year, month, day, hour, minute, second) = unix_to_datetime(timestamp);
    let yy = year.rem_euclid(100);
    format!("{yy:02}{month:02}{day:02}{hour:02}{minute:02}{second:02}Z")
}

/// Format a UNIX timestamp as GeneralizedTime "YYYYMMDDHHMMSSZ".
pub fn format_generalized_time(timestamp: i64) -> String {
    let (year, month, day, hour, minute, second) = unix_to_datetime(timestamp);
    format!("{year:04}{month:02}{day:02}{hour:02}{minute:02}{second:02}Z")
}
