use crate::chrono::{calendar::CalendarSystem, gregorian::month_length};

/// The days from 0000-03-01 to 1970-01-01, both in the proleptic Julian
/// calendar. (1970-01-01 Gregorian is 1969-12-19 Julian.)
const JULIAN_EPOCH_OFFSET: i64 = 719_470;

/// The proleptic Julian calendar with astronomical year numbering.
///
/// Every fourth year is a leap year, without the Gregorian century
/// exceptions. Weeks follow the same ISO rules as
/// [`GregorianCalendar`](crate::chrono::GregorianCalendar).
///
/// # Example
///
/// ```
/// use calendrical::chrono::{CalendarSystem, JulianCalendar};
///
/// let cal = JulianCalendar;
/// assert!(cal.is_leap_year(1900));
/// // 1970-01-01 Julian is 13 days after 1970-01-01 Gregorian.
/// assert_eq!(cal.year_start_day(1970), 13);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JulianCalendar;

impl CalendarSystem for JulianCalendar {
    fn id(&self) -> &'static str {
        "Julian"
    }

    fn is_leap_year(&self, year: i32) -> bool {
        year.rem_euclid(4) == 0
    }

    fn year_start_day(&self, year: i32) -> i64 {
        // Same March-based counting as the Gregorian calendar, but with a
        // four year cycle.
        let y = i64::from(year) - 1;
        let era = y.div_euclid(4);
        let yoe = y - era * 4;
        let doe = yoe * 365 + 306;
        era * 1_461 + doe - JULIAN_EPOCH_OFFSET
    }

    fn days_in_year_month(&self, year: i32, month: i32) -> i32 {
        month_length(month, self.is_leap_year(year))
    }

    fn max_days_in_month(&self, month: i32) -> i32 {
        month_length(month, true)
    }

    fn average_millis_per_year(&self) -> i64 {
        // 365.25 days.
        31_557_600_000
    }
}
