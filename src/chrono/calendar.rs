/*!
The calendar system abstraction and the date arithmetic shared by every
calendar system.

A [`CalendarSystem`] only describes a handful of facts: which years are leap
years, where each year starts relative to the epoch and how long each month
is. Everything else (year-of-instant lookup, month arithmetic, week-year
rules) is derived generically in this module, which is why adding a new
calendar system takes very little code.

All dates here are in "astronomical" year numbering: the year before year
`1` is year `0`, and the one before that is `-1`.
*/

use std::sync::Arc;

use crate::{
    chrono::Fields,
    util::arith::{self, floor_div, floor_mod, MILLIS_PER_DAY},
    Error,
};

/// The rules of a calendar system.
///
/// Implementations describe years and months. A
/// [`Chronology`](crate::chrono::Chronology) turns them into a complete set
/// of fields.
///
/// # Example
///
/// ```
/// use calendrical::chrono::{CalendarSystem, GregorianCalendar};
///
/// let cal = GregorianCalendar;
/// assert!(cal.is_leap_year(2000));
/// assert!(!cal.is_leap_year(1900));
/// assert_eq!(cal.days_in_year_month(2024, 2), 29);
/// assert_eq!(cal.year_start_day(1970), 0);
/// ```
pub trait CalendarSystem: std::fmt::Debug + Send + Sync + 'static {
    /// A short, unique identifier for this calendar system, e.g. `ISO`.
    ///
    /// Two chronologies are equal only if their calendar identifiers are
    /// equal.
    fn id(&self) -> &'static str;

    /// Whether the given year has an extra day.
    fn is_leap_year(&self, year: i32) -> bool;

    /// The number of days from 1970-01-01 (in the proleptic Gregorian
    /// calendar) to the first day of the given year in this calendar.
    fn year_start_day(&self, year: i32) -> i64;

    /// The number of days in the given month of the given year.
    ///
    /// `month` is always in `1..=self.months_in_year()`.
    fn days_in_year_month(&self, year: i32, month: i32) -> i32;

    /// The largest number of days the given month can have in any year.
    fn max_days_in_month(&self, month: i32) -> i32;

    /// The average length of a year in milliseconds. This is only used to
    /// estimate which year an instant is in.
    fn average_millis_per_year(&self) -> i64;

    /// The number of months in every year.
    fn months_in_year(&self) -> i32 {
        12
    }

    /// The number of days in the given year.
    fn days_in_year(&self, year: i32) -> i32 {
        if self.is_leap_year(year) {
            366
        } else {
            365
        }
    }

    /// The minimum number of days of a new year that the first week of a
    /// week-year must contain. Weeks begin on Monday.
    ///
    /// The default of `4` gives ISO-8601 week numbering.
    fn min_days_in_first_week(&self) -> i32 {
        4
    }

    /// A hook for modifying the standard field set before it is bound to a
    /// time zone.
    ///
    /// A calendar system can replace fields with its own implementations or
    /// remove field types it doesn't define. Asking a chronology for a
    /// removed field type returns an error for which
    /// [`Error::is_unsupported_field`] returns `true`.
    fn assemble(&self, fields: &mut Fields) -> Result<(), Error> {
        let _ = fields;
        Ok(())
    }
}

/// A shared calendar system, as stored in chronologies and fields.
pub(crate) type Calendar = Arc<dyn CalendarSystem>;

/// Returns the epoch day (days since 1970-01-01) containing `instant`.
pub(crate) fn epoch_day_of(instant: i64) -> i64 {
    floor_div(instant, MILLIS_PER_DAY)
}

/// Returns the milliseconds elapsed since the start of the day containing
/// `instant`.
pub(crate) fn millis_of_day(instant: i64) -> i64 {
    floor_mod(instant, MILLIS_PER_DAY)
}

/// Returns the instant at the given epoch day and time of day.
///
/// The start of the day containing `i64::MIN` is not representable, but
/// later times on that day are, so this doesn't compute the start of the
/// day on its own.
pub(crate) fn instant_of(
    epoch_day: i64,
    millis_of_day: i64,
) -> Result<i64, Error> {
    let instant = i128::from(epoch_day) * i128::from(MILLIS_PER_DAY)
        + i128::from(millis_of_day);
    i64::try_from(instant).map_err(|_| Error::overflow("instant of day"))
}

/// Returns the first instant of the day containing `instant`.
pub(crate) fn day_floor(instant: i64) -> Result<i64, Error> {
    arith::sub(instant, millis_of_day(instant), "start of day")
}

/// Returns the year containing the given epoch day.
pub(crate) fn year_of_day(cal: &dyn CalendarSystem, day: i64) -> i32 {
    let millis = i128::from(day) * i128::from(MILLIS_PER_DAY);
    let estimate =
        millis.div_euclid(i128::from(cal.average_millis_per_year()));
    // Epoch days range over roughly +/- 10^14, so the estimate is well
    // within an i32. The loop corrects it by at most a year or two.
    let mut year = (1970 + estimate) as i32;
    loop {
        let start = cal.year_start_day(year);
        if day < start {
            year -= 1;
        } else if day >= start + i64::from(cal.days_in_year(year)) {
            year += 1;
        } else {
            return year;
        }
    }
}

/// Returns the year containing the given instant.
pub(crate) fn year_of(cal: &dyn CalendarSystem, instant: i64) -> i32 {
    year_of_day(cal, epoch_day_of(instant))
}

/// A calendar date broken into its parts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct YearMonthDay {
    pub(crate) year: i32,
    pub(crate) month: i32,
    pub(crate) day: i32,
}

/// Returns the number of days in `year` before the first day of `month`.
pub(crate) fn days_before_month(
    cal: &dyn CalendarSystem,
    year: i32,
    month: i32,
) -> i32 {
    (1..month).map(|m| cal.days_in_year_month(year, m)).sum()
}

/// Returns the 1-based day of the year for the given epoch day.
pub(crate) fn day_of_year_of_day(cal: &dyn CalendarSystem, day: i64) -> i32 {
    let year = year_of_day(cal, day);
    // OK because a year has at most a few hundred days.
    (day - cal.year_start_day(year)) as i32 + 1
}

/// Returns the date for the given epoch day.
pub(crate) fn ymd_of_day(cal: &dyn CalendarSystem, day: i64) -> YearMonthDay {
    let year = year_of_day(cal, day);
    // OK because a year has at most a few hundred days.
    let mut remaining = (day - cal.year_start_day(year)) as i32;
    let mut month = 1;
    loop {
        let len = cal.days_in_year_month(year, month);
        if remaining < len || month >= cal.months_in_year() {
            return YearMonthDay { year, month, day: remaining + 1 };
        }
        remaining -= len;
        month += 1;
    }
}

/// Returns the date containing the given instant.
pub(crate) fn ymd_of(cal: &dyn CalendarSystem, instant: i64) -> YearMonthDay {
    ymd_of_day(cal, epoch_day_of(instant))
}

/// Returns the epoch day of the given date. The date must be valid.
pub(crate) fn epoch_day(cal: &dyn CalendarSystem, ymd: YearMonthDay) -> i64 {
    cal.year_start_day(ymd.year)
        + i64::from(days_before_month(cal, ymd.year, ymd.month))
        + i64::from(ymd.day - 1)
}

/// Returns `instant` moved to the given year and month, keeping its day of
/// month (clamped to the new month's length) and time of day.
pub(crate) fn with_year_month(
    cal: &dyn CalendarSystem,
    instant: i64,
    year: i32,
    month: i32,
) -> Result<i64, Error> {
    let day =
        ymd_of(cal, instant).day.min(cal.days_in_year_month(year, month));
    let date = YearMonthDay { year, month, day };
    instant_of(epoch_day(cal, date), millis_of_day(instant))
}

/// Adds months to `instant`, clamping the day of month.
pub(crate) fn add_months(
    cal: &dyn CalendarSystem,
    instant: i64,
    months: i64,
) -> Result<i64, Error> {
    if months == 0 {
        return Ok(instant);
    }
    let per_year = i64::from(cal.months_in_year());
    let ymd = ymd_of(cal, instant);
    let ordinal = i64::from(ymd.year) * per_year + i64::from(ymd.month - 1);
    let ordinal = arith::add(ordinal, months, "add months")?;
    let year = arith::to_i32(floor_div(ordinal, per_year), "add months")?;
    // OK because the residue is less than `months_in_year`.
    let month = floor_mod(ordinal, per_year) as i32 + 1;
    check_year(cal, year, "add months")?;
    with_year_month(cal, instant, year, month)
}

/// Adds years to `instant`, clamping the day of month.
pub(crate) fn add_years(
    cal: &dyn CalendarSystem,
    instant: i64,
    years: i64,
) -> Result<i64, Error> {
    if years == 0 {
        return Ok(instant);
    }
    let ymd = ymd_of(cal, instant);
    let year = arith::add(i64::from(ymd.year), years, "add years")?;
    let year = arith::to_i32(year, "add years")?;
    check_year(cal, year, "add years")?;
    with_year_month(cal, instant, year, ymd.month)
}

/// Returns an overflow error if `year` can't contain a representable
/// instant in this calendar.
///
/// This keeps `year_start_day` and friends away from years so large that
/// their day counts could overflow.
fn check_year(
    cal: &dyn CalendarSystem,
    year: i32,
    what: &'static str,
) -> Result<(), Error> {
    let (min, max) = year_bounds(cal);
    if year < min || year > max {
        return Err(Error::overflow(what));
    }
    Ok(())
}

/// Returns the range of years that contain at least one representable
/// instant.
pub(crate) fn year_bounds(cal: &dyn CalendarSystem) -> (i32, i32) {
    (year_of(cal, i64::MIN), year_of(cal, i64::MAX))
}

/// Returns the largest `n` such that `add(n) <= minuend`, starting from an
/// estimate that is expected to be within a couple of units of the answer.
///
/// `add(n)` must be monotonically non-decreasing in `n`. An overflowing
/// `add(n)` is treated as passing `minuend`. If no `n` close to the
/// estimate fits, the span can't be counted and overflow is reported.
pub(crate) fn floor_count(
    minuend: i64,
    estimate: i64,
    what: &'static str,
    add: impl Fn(i64) -> Result<i64, Error>,
) -> Result<i64, Error> {
    const MAX_CORRECTION: i64 = 4;

    let fits = |n: i64| add(n).map_or(false, |t| t <= minuend);
    let mut n = estimate;
    while !fits(n) {
        if estimate - n >= MAX_CORRECTION {
            return Err(Error::overflow(what));
        }
        n -= 1;
    }
    while n < i64::MAX && fits(n + 1) {
        n += 1;
    }
    Ok(n)
}

/// Returns the number of whole months from `subtrahend` to `minuend`,
/// floored and consistent with `add_months`.
pub(crate) fn months_between(
    cal: &dyn CalendarSystem,
    minuend: i64,
    subtrahend: i64,
) -> Result<i64, Error> {
    let per_year = i64::from(cal.months_in_year());
    let (a, b) = (ymd_of(cal, minuend), ymd_of(cal, subtrahend));
    let estimate = (i64::from(a.year) - i64::from(b.year)) * per_year
        + i64::from(a.month - b.month);
    floor_count(minuend, estimate, "months between", |n| {
        add_months(cal, subtrahend, n)
    })
}

/// Returns the number of whole years from `subtrahend` to `minuend`,
/// floored and consistent with `add_years`.
pub(crate) fn years_between(
    cal: &dyn CalendarSystem,
    minuend: i64,
    subtrahend: i64,
) -> Result<i64, Error> {
    let estimate =
        i64::from(year_of(cal, minuend)) - i64::from(year_of(cal, subtrahend));
    floor_count(minuend, estimate, "years between", |n| {
        add_years(cal, subtrahend, n)
    })
}

/// Returns the ISO day of week (Monday is `1`, Sunday is `7`) of the given
/// epoch day.
pub(crate) fn day_of_week_of_day(day: i64) -> i32 {
    // 1970-01-01 was a Thursday.
    floor_mod(day + 3, 7) as i32 + 1
}

/// Returns the epoch day on which week one of the given week-year starts.
pub(crate) fn weekyear_start_day(
    cal: &dyn CalendarSystem,
    weekyear: i32,
) -> i64 {
    let jan1 = cal.year_start_day(weekyear);
    let dow = i64::from(day_of_week_of_day(jan1));
    if dow > i64::from(8 - cal.min_days_in_first_week()) {
        // Too few days of the new year in this week, so week one is the
        // next one.
        jan1 + (8 - dow)
    } else {
        jan1 - (dow - 1)
    }
}

/// Returns the number of weeks in the given week-year, `52` or `53`.
pub(crate) fn weeks_in_weekyear(
    cal: &dyn CalendarSystem,
    weekyear: i32,
) -> i32 {
    let days = weekyear_start_day(cal, weekyear + 1)
        - weekyear_start_day(cal, weekyear);
    // OK because a week-year has 52 or 53 weeks.
    (days / 7) as i32
}

/// Returns the week-year containing the given epoch day.
pub(crate) fn weekyear_of_day(cal: &dyn CalendarSystem, day: i64) -> i32 {
    let year = year_of_day(cal, day);
    if day < weekyear_start_day(cal, year) {
        year - 1
    } else if day >= weekyear_start_day(cal, year + 1) {
        year + 1
    } else {
        year
    }
}

/// Returns the 1-based week of its week-year of the given epoch day.
pub(crate) fn week_of_weekyear_of_day(
    cal: &dyn CalendarSystem,
    day: i64,
) -> i32 {
    let start = weekyear_start_day(cal, weekyear_of_day(cal, day));
    // OK because a week-year has 52 or 53 weeks.
    ((day - start) / 7) as i32 + 1
}

/// Returns `instant` moved to the given week-year, keeping its week (clamped
/// to the number of weeks in the new week-year), day of week and time of
/// day.
pub(crate) fn with_weekyear(
    cal: &dyn CalendarSystem,
    instant: i64,
    weekyear: i32,
) -> Result<i64, Error> {
    let day = epoch_day_of(instant);
    let week = week_of_weekyear_of_day(cal, day)
        .min(weeks_in_weekyear(cal, weekyear));
    let dow = day_of_week_of_day(day);
    let new_day = weekyear_start_day(cal, weekyear)
        + i64::from(week - 1) * 7
        + i64::from(dow - 1);
    instant_of(new_day, millis_of_day(instant))
}

/// Adds week-years to `instant`, keeping its week and day of week.
pub(crate) fn add_weekyears(
    cal: &dyn CalendarSystem,
    instant: i64,
    weekyears: i64,
) -> Result<i64, Error> {
    if weekyears == 0 {
        return Ok(instant);
    }
    let current = weekyear_of_day(cal, epoch_day_of(instant));
    let weekyear = arith::add(i64::from(current), weekyears, "add weekyears")?;
    let weekyear = arith::to_i32(weekyear, "add weekyears")?;
    check_year(cal, weekyear, "add weekyears")?;
    with_weekyear(cal, instant, weekyear)
}

/// Returns the number of whole week-years from `subtrahend` to `minuend`.
pub(crate) fn weekyears_between(
    cal: &dyn CalendarSystem,
    minuend: i64,
    subtrahend: i64,
) -> Result<i64, Error> {
    let (a, b) = (epoch_day_of(minuend), epoch_day_of(subtrahend));
    let estimate = i64::from(weekyear_of_day(cal, a))
        - i64::from(weekyear_of_day(cal, b));
    floor_count(minuend, estimate, "weekyears between", |n| {
        add_weekyears(cal, subtrahend, n)
    })
}

#[cfg(test)]
mod tests {
    use crate::chrono::{GregorianCalendar, JulianCalendar};

    use super::*;

    #[test]
    fn ymd_roundtrip_gregorian() {
        let cal = GregorianCalendar;
        for year in [-2001, -401, -1, 0, 1, 1969, 1970, 2000, 2024, 99999] {
            for month in 1..=12 {
                for day in 1..=cal.days_in_year_month(year, month) {
                    let ymd = YearMonthDay { year, month, day };
                    let epoch = epoch_day(&cal, ymd);
                    assert_eq!(ymd_of_day(&cal, epoch), ymd, "{epoch}");
                }
            }
        }
    }

    #[test]
    fn known_epoch_days() {
        let cal = GregorianCalendar;
        let d = |year, month, day| {
            epoch_day(&cal, YearMonthDay { year, month, day })
        };
        assert_eq!(d(1970, 1, 1), 0);
        assert_eq!(d(2002, 3, 31), 11_777);
        assert_eq!(d(2002, 10, 27), 11_987);
        assert_eq!(d(2000, 2, 29), 11_016);
        assert_eq!(d(1969, 12, 31), -1);
        assert_eq!(d(0, 1, 1), -719_528);
    }

    #[test]
    fn year_bounds_cover_all_instants() {
        let cal = GregorianCalendar;
        assert_eq!(year_bounds(&cal), (-292_275_055, 292_278_994));
        let julian = JulianCalendar;
        let (min, max) = year_bounds(&julian);
        assert!(min < -292_000_000 && max > 292_000_000);
    }

    #[test]
    fn add_months_clamps() {
        let cal = GregorianCalendar;
        let jan31 = instant_of(
            epoch_day(&cal, YearMonthDay { year: 2023, month: 1, day: 31 }),
            5,
        )
        .unwrap();
        let feb = add_months(&cal, jan31, 1).unwrap();
        assert_eq!(
            ymd_of(&cal, feb),
            YearMonthDay { year: 2023, month: 2, day: 28 },
        );
        assert_eq!(millis_of_day(feb), 5);
        let back = add_months(&cal, jan31, -13).unwrap();
        assert_eq!(
            ymd_of(&cal, back),
            YearMonthDay { year: 2021, month: 12, day: 31 },
        );
        assert!(add_months(&cal, jan31, i64::MAX).unwrap_err().is_overflow());
        assert!(add_months(&cal, i64::MAX, 1).unwrap_err().is_overflow());
        // The month before the earliest instant isn't representable.
        let err = months_between(&cal, i64::MIN, i64::MIN + 1).unwrap_err();
        assert!(err.is_overflow());
    }

    #[test]
    fn months_between_is_floored() {
        let cal = GregorianCalendar;
        let at = |year, month, day| {
            let day = epoch_day(&cal, YearMonthDay { year, month, day });
            instant_of(day, 0).unwrap()
        };
        let months = |a, b| months_between(&cal, a, b).unwrap();
        let years = |a, b| years_between(&cal, a, b).unwrap();
        assert_eq!(months(at(2023, 3, 31), at(2023, 1, 31)), 2);
        assert_eq!(months(at(2023, 3, 30), at(2023, 1, 31)), 1);
        // Jan 31 + 1 month is Feb 28, so a month has elapsed on Feb 28.
        assert_eq!(months(at(2023, 2, 28), at(2023, 1, 31)), 1);
        assert_eq!(months(at(2023, 1, 31), at(2023, 3, 31)), -2);
        assert_eq!(months(at(2023, 1, 30), at(2023, 3, 31)), -3);
        assert_eq!(years(at(2024, 2, 28), at(2020, 2, 29)), 3);
        assert_eq!(years(at(2024, 2, 29), at(2020, 2, 29)), 4);
    }

    #[test]
    fn iso_weeks() {
        let cal = GregorianCalendar;
        let d = |year, month, day| {
            epoch_day(&cal, YearMonthDay { year, month, day })
        };
        // 2008-12-29 is Monday of week 1 of 2009.
        assert_eq!(day_of_week_of_day(d(2008, 12, 29)), 1);
        assert_eq!(weekyear_of_day(&cal, d(2008, 12, 29)), 2009);
        assert_eq!(week_of_weekyear_of_day(&cal, d(2008, 12, 29)), 1);
        // 2010-01-03 is Sunday of week 53 of 2009.
        assert_eq!(weekyear_of_day(&cal, d(2010, 1, 3)), 2009);
        assert_eq!(week_of_weekyear_of_day(&cal, d(2010, 1, 3)), 53);
        assert_eq!(weeks_in_weekyear(&cal, 2009), 53);
        assert_eq!(weeks_in_weekyear(&cal, 2010), 52);
        assert_eq!(day_of_week_of_day(0), 4);
    }

    #[test]
    fn weekyear_clamps_week() {
        let cal = GregorianCalendar;
        // Sunday of week 53 of 2009 moved to 2010, which has 52 weeks.
        let day =
            epoch_day(&cal, YearMonthDay { year: 2010, month: 1, day: 3 });
        let moved =
            with_weekyear(&cal, instant_of(day, 0).unwrap(), 2010).unwrap();
        let moved = epoch_day_of(moved);
        assert_eq!(weekyear_of_day(&cal, moved), 2010);
        assert_eq!(week_of_weekyear_of_day(&cal, moved), 52);
        assert_eq!(day_of_week_of_day(moved), 7);
    }
}
