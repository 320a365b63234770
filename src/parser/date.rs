//! RFC 822 / RFC 1123 `Date:` header parsing.
//!
//! Only the common fixed layout `Www, d Mon yyyy hh:mm:ss +HHMM` is
//! understood. The UTC offset is read by dropping every `0` from the digits
//! after `+`, so only whole-hour, zero-padded offsets come out right
//! (`+0200` is two hours, `+1000` reads as one hour and `+0530` as 53 hours,
//! which is rejected). Negative offsets are not recognized.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

/// Values shorter than this are truncated or garbage.
const MIN_DATE_LEN: usize = 25;

/// Characters skipped at the start (`"Mon,"`).
const WEEKDAY_LEN: usize = 4;

const MONTHS: [(&str, &str); 12] = [
    ("Jan", "01"),
    ("Feb", "02"),
    ("Mar", "03"),
    ("Apr", "04"),
    ("May", "05"),
    ("Jun", "06"),
    ("Jul", "07"),
    ("Aug", "08"),
    ("Sep", "09"),
    ("Oct", "10"),
    ("Nov", "11"),
    ("Dec", "12"),
];

/// Parse a `Date:` header value into an instant with its UTC offset.
///
/// Example: `"Mon, 02 Jan 2023 15:04:05 +0200"` → 2023-01-02T15:04:05+02:00
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    if value.chars().count() < MIN_DATE_LEN {
        debug!(date = value, "Date value too short");
        return None;
    }

    let mut text: String = value.chars().skip(WEEKDAY_LEN).collect();
    if let Some(comment) = text.find('(') {
        if comment > 0 {
            text.truncate(comment);
        }
    }

    let Some(plus) = text.find('+') else {
        debug!(date = value, "Date has no '+' UTC offset");
        return None;
    };
    let offset_token = text[plus + 1..].trim();
    if offset_token.chars().count() < 4 {
        debug!(date = value, "UTC offset too short");
        return None;
    }

    let digits: String = offset_token.chars().filter(|&c| c != '0').collect();
    let hours: i32 = if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or_else(|_| {
            debug!(offset = offset_token, "Non-numeric UTC offset, using +0");
            0
        })
    };
    let Some(offset) = hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
    else {
        warn!(
            date = value,
            offset = offset_token,
            "UTC offset is not a whole-hour offset, date dropped"
        );
        return None;
    };

    // Drop the separator before '+' along with the offset.
    let mut stamp = text[..plus].to_string();
    stamp.pop();

    for (name, number) in MONTHS {
        if stamp.contains(name) {
            stamp = stamp.replace(name, number);
            break;
        }
    }

    let naive = match NaiveDateTime::parse_from_str(stamp.trim(), "%d %m %Y %H:%M:%S") {
        Ok(naive) => naive,
        Err(e) => {
            debug!(date = value, error = %e, "Date does not match the RFC 822 layout");
            return None;
        }
    };
    offset.from_local_datetime(&naive).single()
}
