//! Text codecs for the two timestamp layouts found in lease records.
//!
//! Key-value records store `yyyy-MM-dd'T'HH:mm:ssX` (second precision, numeric
//! zone). Structured records store Kubernetes MicroTime (RFC3339, microseconds).

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::MalformedTimestamp;

const LOCAL_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S";
const LOCAL_DATE_TIME_LEN: usize = 19;

/// Formats an instant for a key-value record. Always written in UTC (`Z`).
pub fn format_local_timestamp(instant: DateTime<Utc>) -> String {
    format!("{}Z", instant.format(LOCAL_DATE_TIME))
}

/// Parses a key-value record timestamp. Accepts `Z`, `+HH`, `+HHMM` and `+HH:MM` zones.
pub fn parse_local_timestamp(value: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    let malformed = || MalformedTimestamp::new(value);

    let (local, zone) = match (value.get(..LOCAL_DATE_TIME_LEN), value.get(LOCAL_DATE_TIME_LEN..)) {
        (Some(local), Some(zone)) => (local, zone),
        _ => return Err(malformed()),
    };

    let naive = NaiveDateTime::parse_from_str(local, LOCAL_DATE_TIME).map_err(|_| malformed())?;
    let offset = parse_zone_offset(zone).ok_or_else(malformed)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(malformed)
}

fn parse_zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone == "Z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = if let Some(rest) = zone.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = zone.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };

    let compact: String = match digits.len() {
        2 | 4 => digits.to_string(),
        5 if digits.as_bytes()[2] == b':' => digits.replacen(':', "", 1),
        _ => return None,
    };
    if !compact.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = compact[..2].parse().ok()?;
    let minutes: i32 = if compact.len() == 4 {
        compact[2..].parse().ok()?
    } else {
        0
    };
    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Formats an instant as Kubernetes MicroTime.
pub fn format_micro_time(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_micro_time(value: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| MalformedTimestamp::new(value))
}
