//! Solar Hijri (Jalali) calendar arithmetic and Tehran wall-clock offsets.
//!
//! Day conversion follows Borkowski's break-year table, valid for Jalali
//! years -61..3177.

use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};

const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

const TEHRAN_STANDARD_SECS: i32 = 3 * 3600 + 30 * 60;
const TEHRAN_DAYLIGHT_SECS: i32 = 4 * 3600 + 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

struct YearInfo {
    /// 0 when the year itself is leap; 1 when the previous one was.
    leap: i32,
    gregorian_year: i32,
    /// Day of March on which 1 Farvardin falls.
    march: i32,
}

fn year_info(jy: i32) -> Option<YearInfo> {
    if jy < BREAKS[0] || jy >= BREAKS[BREAKS.len() - 1] {
        return None;
    }
    let gregorian_year = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;
    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }
    let mut n = jy - jp;

    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }
    let leap_g = gregorian_year / 4 - (gregorian_year / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }
    Some(YearInfo {
        leap,
        gregorian_year,
        march,
    })
}

impl JalaliDate {
    /// Validated constructor.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 {
            return None;
        }
        if day > Self::days_in_month(year, month)? {
            return None;
        }
        Some(Self { year, month, day })
    }

    pub fn is_leap_year(year: i32) -> Option<bool> {
        year_info(year).map(|info| info.leap == 0)
    }

    pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
        match month {
            1..=6 => Some(31),
            7..=11 => Some(30),
            12 => Self::is_leap_year(year).map(|leap| if leap { 30 } else { 29 }),
            _ => None,
        }
    }

    pub fn from_gregorian(date: NaiveDate) -> Option<Self> {
        let mut jy = date.year() - 621;
        let info = year_info(jy)?;
        let farvardin_first = NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march as u32)?;
        let mut k = (date - farvardin_first).num_days();
        if k >= 0 {
            if k <= 185 {
                return Some(Self {
                    year: jy,
                    month: 1 + (k / 31) as u32,
                    day: (k % 31) as u32 + 1,
                });
            }
            k -= 186;
        } else {
            jy -= 1;
            k += 179;
            if info.leap == 1 {
                k += 1;
            }
        }
        Some(Self {
            year: jy,
            month: 7 + (k / 30) as u32,
            day: (k % 30) as u32 + 1,
        })
    }

    pub fn to_gregorian(self) -> Option<NaiveDate> {
        let info = year_info(self.year)?;
        let farvardin_first = NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march as u32)?;
        let month = i64::from(self.month);
        let offset = (month - 1) * 31 - (month / 7) * (month - 7) + i64::from(self.day) - 1;
        farvardin_first.checked_add_signed(Duration::days(offset))
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// UTC offset in force in Tehran at the given local wall-clock time.
///
/// Daylight time ran from 2 Farvardin 00:00 to the end of 30 Shahrivar in
/// 1370-1384 and 1387-1401; it was abolished afterwards.
pub fn tehran_offset(local: NaiveDateTime) -> FixedOffset {
    let daylight = JalaliDate::from_gregorian(local.date()).is_some_and(|j| {
        let dst_year = (1370..=1384).contains(&j.year) || (1387..=1401).contains(&j.year);
        let in_season = match j.month {
            1 => j.day >= 2,
            2..=5 => true,
            6 => j.day <= 30,
            _ => false,
        };
        dst_year && in_season
    });
    let secs = if daylight {
        TEHRAN_DAYLIGHT_SECS
    } else {
        TEHRAN_STANDARD_SECS
    };
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// Attach the Tehran offset to a local wall-clock time.
pub fn resolve_tehran(local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    tehran_offset(local).from_local_datetime(&local).single()
}

/// The same instant seen on a Tehran wall clock.
pub fn to_tehran(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let standard = Duration::seconds(i64::from(TEHRAN_STANDARD_SECS));
    let offset = tehran_offset(instant.naive_utc() + standard);
    instant.with_timezone(&offset)
}
