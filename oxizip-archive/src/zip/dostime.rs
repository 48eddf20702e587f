//! MS-DOS packed date/time conversion.
//!
//! Time: bits 0-4 seconds/2, 5-10 minutes, 11-15 hours.
//! Date: bits 0-4 day, 5-8 month, 9-15 years since 1980.

use chrono::{
    DateTime, Datelike, Local, LocalResult, Months, NaiveDate, NaiveDateTime, TimeDelta,
    TimeZone, Timelike,
};

/// Decode a packed DOS date/time pair into local time.
///
/// Out-of-range fields are normalized the way `mktime` does: month 0 is
/// December of the previous year, day 0 the last day of the previous month,
/// and 60 or 62 seconds carry into the next minute. A zeroed date is
/// therefore 1979-11-30. Ambiguous local times resolve to the earlier
/// instant; times skipped by a DST transition are read with the offset in
/// force before it, landing after the gap.
pub fn dos_to_local(date: u16, time: u16) -> Option<DateTime<Local>> {
    let year = 1980 + i32::from(date >> 9);
    let month = u32::from((date >> 5) & 0x0F);
    let day = i64::from(date & 0x1F);

    let seconds = i64::from(time >> 11) * 3600
        + i64::from((time >> 5) & 0x3F) * 60
        + i64::from(time & 0x1F) * 2;

    let january = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let first_of_month = if month == 0 {
        january.checked_sub_months(Months::new(1))?
    } else {
        january.checked_add_months(Months::new(month - 1))?
    };
    let naive = first_of_month
        .checked_add_signed(TimeDelta::days(day - 1))?
        .checked_add_signed(TimeDelta::seconds(seconds))?;

    resolve_local(naive)
}

/// Map a naive local time onto the local zone.
fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(timestamp) => Some(timestamp),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let before = Local
                .from_local_datetime(&naive.checked_sub_signed(TimeDelta::days(1))?)
                .earliest()?;
            let offset = i64::from(before.offset().local_minus_utc());
            let utc = naive.checked_sub_signed(TimeDelta::seconds(offset))?;
            Some(Local.from_utc_datetime(&utc))
        }
    }
}

/// Encode a local time as a packed `(date, time)` pair.
///
/// Years outside 1980..=2107 are clamped to the representable range.
pub fn local_to_dos(timestamp: &DateTime<Local>) -> (u16, u16) {
    let year = timestamp.year().clamp(1980, 2107);
    let date = (((year - 1980) as u16) << 9)
        | ((timestamp.month() as u16) << 5)
        | timestamp.day() as u16;
    let time = ((timestamp.hour() as u16) << 11)
        | ((timestamp.minute() as u16) << 5)
        | (timestamp.second() as u16 / 2);
    (date, time)
}

/// The current local time in DOS format.
pub fn now_dos() -> (u16, u16) {
    local_to_dos(&Local::now())
}
