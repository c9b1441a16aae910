//! Calendar period resolution for aggregation queries.
//!
//! A period is an inclusive range of instants covering one calendar month
//! or one calendar day. Bounds are computed at second resolution in UTC,
//! matching the unix-second storage of expense dates. The viewer's local
//! timezone is applied later, when raw records are re-bucketed per day
//! (see [crate::aggregation]).

use time::{Date, Duration, Month, OffsetDateTime, Time};

use crate::Error;

/// An inclusive range of instants scoping an aggregation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    /// The first instant of the period.
    pub start: OffsetDateTime,
    /// The last instant of the period (inclusive, second resolution).
    pub end: OffsetDateTime,
}

impl PeriodBounds {
    /// The period as inclusive unix timestamps, as stored in the expense
    /// table.
    pub fn unix_range(&self) -> (i64, i64) {
        (self.start.unix_timestamp(), self.end.unix_timestamp())
    }
}

/// The bounds of a calendar month in UTC.
pub fn month_bounds(year: i32, month: Month) -> PeriodBounds {
    let start = Date::from_calendar_date(year, month, 1)
        .expect("invalid month start date")
        .midnight()
        .assume_utc();
    let end = Date::from_calendar_date(year, month, last_day_of_month(year, month))
        .expect("invalid month end date")
        .with_time(end_of_day())
        .assume_utc();

    PeriodBounds { start, end }
}

/// Month bounds widened by one calendar day on each side.
///
/// This is the server-side timezone buffer: expenses dated near midnight
/// in the viewer's timezone can fall just outside the UTC month, so the
/// dashboard and analytics queries fetch one extra day on both ends and
/// leave the precise cut to the per-day bucketing step.
pub fn widened_month_bounds(year: i32, month: Month) -> PeriodBounds {
    let bounds = month_bounds(year, month);

    PeriodBounds {
        start: bounds.start - Duration::days(1),
        end: bounds.end + Duration::days(1),
    }
}

/// The bounds of a single calendar day in UTC.
pub fn day_bounds(date: Date) -> PeriodBounds {
    PeriodBounds {
        start: date.midnight().assume_utc(),
        end: date.with_time(end_of_day()).assume_utc(),
    }
}

/// The (year, month) immediately before the given one.
pub fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        month => (year, month.previous()),
    }
}

/// Convert a 1-12 month number into a [Month].
///
/// # Errors
/// Returns [Error::InvalidMonth] for numbers outside 1-12.
pub fn month_from_number(month: u8) -> Result<Month, Error> {
    Month::try_from(month).map_err(|_| Error::InvalidMonth(month))
}

/// Check that a year falls within the supported calendar range.
///
/// Period bounds are built from [Date] values, which only cover years
/// 1 through 9999, so client-supplied years must be checked before they
/// reach [month_bounds].
///
/// # Errors
/// Returns [Error::InvalidYear] for years outside 1-9999.
pub fn year_from_number(year: i32) -> Result<i32, Error> {
    if !(1..=9999).contains(&year) {
        return Err(Error::InvalidYear(year));
    }

    Ok(year)
}

fn end_of_day() -> Time {
    Time::from_hms(23, 59, 59).expect("invalid end of day time")
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
