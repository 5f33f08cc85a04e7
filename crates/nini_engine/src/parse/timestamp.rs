use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use nini_core::jalali::{resolve_tehran, JalaliDate};

use super::ascii_digits;

/// Local formats seen in `datePublished` metadata, interpreted as Tehran time.
const LOCAL_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a publication timestamp: RFC 3339 keeps its own offset, local
/// forms resolve in Tehran time, Jalali stamps are converted.
pub fn parse_published(raw: &str) -> Option<DateTime<FixedOffset>> {
    let value = ascii_digits(raw.trim());
    if value.is_empty() {
        return None;
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(&value) {
        return Some(stamp);
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
        .filter(|local| local.year() > 1900)
        .and_then(resolve_tehran)
        .or_else(|| parse_jalali_stamp(&value))
}

/// Parse `YYYY/MM/DD | HH:MM` style stamps. Years between 1200 and 1600 are
/// Jalali, years after 1900 Gregorian; both are Tehran local time.
pub fn parse_jalali_stamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let value = ascii_digits(raw);
    let numbers: Vec<u32> = value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;

    let (year, month, day) = match numbers.as_slice() {
        [year, month, day, ..] => (i32::try_from(*year).ok()?, *month, *day),
        _ => return None,
    };
    let date = match year {
        1200..=1600 => JalaliDate::new(year, month, day)?.to_gregorian()?,
        1901.. => NaiveDate::from_ymd_opt(year, month, day)?,
        _ => return None,
    };
    let time = match numbers.get(3..) {
        Some([hour, minute, second, ..]) => NaiveTime::from_hms_opt(*hour, *minute, *second)?,
        Some([hour, minute]) => NaiveTime::from_hms_opt(*hour, *minute, 0)?,
        _ => NaiveTime::MIN,
    };
    resolve_tehran(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::{parse_jalali_stamp, parse_published};

    #[test]
    fn rfc3339_keeps_its_offset() {
        let stamp = parse_published("2023-01-05T10:00:00+01:00").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2023-01-05T10:00:00+01:00");
    }

    #[test]
    fn us_style_local_time_resolves_in_tehran() {
        let stamp = parse_published("1/5/2023 2:30:00 PM").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2023-01-05T14:30:00+03:30");
    }

    #[test]
    fn jalali_stamp_with_persian_digits() {
        let stamp = parse_jalali_stamp("۱۴۰۱/۰۶/۱۶ | ۱۴:۰۵").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2022-09-07T14:05:00+04:30");
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_published("yesterday"), None);
        assert_eq!(parse_jalali_stamp("1401/13/40"), None);
        assert_eq!(parse_jalali_stamp("99/01/01"), None);
    }
}
