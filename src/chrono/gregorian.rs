use crate::chrono::calendar::CalendarSystem;

/// The days from 0000-03-01 to 1970-01-01 in the proleptic Gregorian
/// calendar.
const GREGORIAN_EPOCH_OFFSET: i64 = 719_468;

/// The ISO-8601 calendar system: the proleptic Gregorian calendar with
/// astronomical year numbering and ISO week numbering.
///
/// This is the calendar system used by
/// [`Chronology::iso`](crate::chrono::Chronology::iso).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GregorianCalendar;

impl CalendarSystem for GregorianCalendar {
    fn id(&self) -> &'static str {
        "ISO"
    }

    fn is_leap_year(&self, year: i32) -> bool {
        // For multiples of 25, divisibility by 16 is the same as
        // divisibility by 400 for the multiples of 100.
        let d = if year % 25 != 0 { 4 } else { 16 };
        (year % d) == 0
    }

    fn year_start_day(&self, year: i32) -> i64 {
        // Counts days in years that start on March 1, which puts the leap
        // day at the end of each year. January 1 of `year` is day 306 of
        // the March-based year that began in `year - 1`.
        let y = i64::from(year) - 1;
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + 306;
        era * 146_097 + doe - GREGORIAN_EPOCH_OFFSET
    }

    fn days_in_year_month(&self, year: i32, month: i32) -> i32 {
        month_length(month, self.is_leap_year(year))
    }

    fn max_days_in_month(&self, month: i32) -> i32 {
        month_length(month, true)
    }

    fn average_millis_per_year(&self) -> i64 {
        // 365.2425 days.
        31_556_952_000
    }
}

/// Returns the length of a month in the Gregorian and Julian calendars.
pub(crate) fn month_length(month: i32, leap: bool) -> i32 {
    if month == 2 {
        if leap {
            29
        } else {
            28
        }
    } else {
        30 | (month ^ month >> 3)
    }
}
