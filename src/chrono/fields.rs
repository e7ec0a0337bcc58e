/*!
Fields and duration fields whose behavior is defined by a calendar system.

Each type here holds a shared [`CalendarSystem`] and delegates the actual
date math to the generic routines in [`calendar`](super::calendar). Fields
that only depend on fixed-length units (like hour-of-day) are built from
[`PreciseDateTimeField`](crate::field::PreciseDateTimeField) instead.
*/

use std::sync::Arc;

use crate::{
    chrono::calendar::{self as cal, Calendar},
    duration::{DurationField, DurationFieldType},
    field::{check_value, DateTimeField, DateTimeFieldType},
    util::arith::{self, MILLIS_PER_DAY},
    Error,
};

/// Months, whose length depends on the month and year.
#[derive(Clone, Debug)]
pub(crate) struct MonthsDurationField {
    cal: Calendar,
}

impl MonthsDurationField {
    pub(crate) fn new(cal: Calendar) -> MonthsDurationField {
        MonthsDurationField { cal }
    }
}

impl DurationField for MonthsDurationField {
    fn field_type(&self) -> DurationFieldType {
        DurationFieldType::Months
    }

    fn is_precise(&self) -> bool {
        false
    }

    fn unit_millis(&self) -> i64 {
        self.cal.average_millis_per_year()
            / i64::from(self.cal.months_in_year())
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        cal::add_months(&*self.cal, instant, amount)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        cal::months_between(&*self.cal, minuend, subtrahend)
    }
}

/// Years, whose length depends on whether the year is a leap year.
#[derive(Clone, Debug)]
pub(crate) struct YearsDurationField {
    cal: Calendar,
}

impl YearsDurationField {
    pub(crate) fn new(cal: Calendar) -> YearsDurationField {
        YearsDurationField { cal }
    }
}

impl DurationField for YearsDurationField {
    fn field_type(&self) -> DurationFieldType {
        DurationFieldType::Years
    }

    fn is_precise(&self) -> bool {
        false
    }

    fn unit_millis(&self) -> i64 {
        self.cal.average_millis_per_year()
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        cal::add_years(&*self.cal, instant, amount)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        cal::years_between(&*self.cal, minuend, subtrahend)
    }
}

/// Week-years, which have either 52 or 53 weeks.
#[derive(Clone, Debug)]
pub(crate) struct WeekyearsDurationField {
    cal: Calendar,
}

impl WeekyearsDurationField {
    pub(crate) fn new(cal: Calendar) -> WeekyearsDurationField {
        WeekyearsDurationField { cal }
    }
}

impl DurationField for WeekyearsDurationField {
    fn field_type(&self) -> DurationFieldType {
        DurationFieldType::WeekYears
    }

    fn is_precise(&self) -> bool {
        false
    }

    fn unit_millis(&self) -> i64 {
        self.cal.average_millis_per_year()
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        cal::add_weekyears(&*self.cal, instant, amount)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        cal::weekyears_between(&*self.cal, minuend, subtrahend)
    }
}

/// The year, in astronomical numbering.
///
/// The supported range is exactly the years that contain at least one
/// representable instant, so `set(m, get(m))` works for every instant.
#[derive(Clone, Debug)]
pub(crate) struct YearField {
    cal: Calendar,
    years: Arc<dyn DurationField>,
    min: i32,
    max: i32,
}

impl YearField {
    pub(crate) fn new(
        cal: Calendar,
        years: Arc<dyn DurationField>,
    ) -> YearField {
        let (min, max) = cal::year_bounds(&*cal);
        YearField { cal, years, min, max }
    }
}

impl DateTimeField for YearField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::Year
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.years
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        None
    }

    fn get(&self, instant: i64) -> i32 {
        cal::year_of(&*self.cal, instant)
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let year = check_value(self, instant, value)?;
        let month = cal::ymd_of(&*self.cal, instant).month;
        cal::with_year_month(&*self.cal, instant, year, month)
    }

    fn minimum_value(&self) -> i32 {
        self.min
    }

    fn maximum_value(&self) -> i32 {
        self.max
    }

    fn is_leap(&self, instant: i64) -> bool {
        self.cal.is_leap_year(self.get(instant))
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let start = self.cal.year_start_day(self.get(instant));
        cal::instant_of(start, 0)
    }
}

/// The month of the year, starting at `1`.
#[derive(Clone, Debug)]
pub(crate) struct MonthOfYearField {
    cal: Calendar,
    months: Arc<dyn DurationField>,
    years: Arc<dyn DurationField>,
}

impl MonthOfYearField {
    pub(crate) fn new(
        cal: Calendar,
        months: Arc<dyn DurationField>,
        years: Arc<dyn DurationField>,
    ) -> MonthOfYearField {
        MonthOfYearField { cal, months, years }
    }
}

impl DateTimeField for MonthOfYearField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::MonthOfYear
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.months
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.years)
    }

    fn get(&self, instant: i64) -> i32 {
        cal::ymd_of(&*self.cal, instant).month
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let month = check_value(self, instant, value)?;
        let year = cal::ymd_of(&*self.cal, instant).year;
        cal::with_year_month(&*self.cal, instant, year, month)
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        self.cal.months_in_year()
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let day = cal::epoch_day_of(instant);
        let ymd = cal::ymd_of_day(&*self.cal, day);
        cal::instant_of(day - i64::from(ymd.day - 1), 0)
    }
}

/// The day of the month, starting at `1`.
///
/// The maximum value at an instant is the length of that instant's month.
#[derive(Clone, Debug)]
pub(crate) struct DayOfMonthField {
    cal: Calendar,
    days: Arc<dyn DurationField>,
    months: Arc<dyn DurationField>,
}

impl DayOfMonthField {
    pub(crate) fn new(
        cal: Calendar,
        days: Arc<dyn DurationField>,
        months: Arc<dyn DurationField>,
    ) -> DayOfMonthField {
        DayOfMonthField { cal, days, months }
    }
}

impl DateTimeField for DayOfMonthField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::DayOfMonth
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.days
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.months)
    }

    fn get(&self, instant: i64) -> i32 {
        cal::ymd_of(&*self.cal, instant).day
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let day = check_value(self, instant, value)?;
        set_by_days(instant, day - self.get(instant))
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        (1..=self.cal.months_in_year())
            .map(|m| self.cal.max_days_in_month(m))
            .max()
            .unwrap_or(31)
    }

    fn maximum_value_at(&self, instant: i64) -> i32 {
        let ymd = cal::ymd_of(&*self.cal, instant);
        self.cal.days_in_year_month(ymd.year, ymd.month)
    }

    fn is_leap(&self, instant: i64) -> bool {
        // The leap day is February 29 in every supported calendar.
        let ymd = cal::ymd_of(&*self.cal, instant);
        ymd.month == 2 && ymd.day == 29
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        cal::day_floor(instant)
    }
}

/// The day of the year, starting at `1`.
#[derive(Clone, Debug)]
pub(crate) struct DayOfYearField {
    cal: Calendar,
    days: Arc<dyn DurationField>,
    years: Arc<dyn DurationField>,
}

impl DayOfYearField {
    pub(crate) fn new(
        cal: Calendar,
        days: Arc<dyn DurationField>,
        years: Arc<dyn DurationField>,
    ) -> DayOfYearField {
        DayOfYearField { cal, days, years }
    }
}

impl DateTimeField for DayOfYearField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::DayOfYear
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.days
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.years)
    }

    fn get(&self, instant: i64) -> i32 {
        cal::day_of_year_of_day(&*self.cal, cal::epoch_day_of(instant))
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let day = check_value(self, instant, value)?;
        set_by_days(instant, day - self.get(instant))
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        366
    }

    fn maximum_value_at(&self, instant: i64) -> i32 {
        self.cal.days_in_year(cal::year_of(&*self.cal, instant))
    }

    fn is_leap(&self, instant: i64) -> bool {
        self.get(instant) > 365
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        cal::day_floor(instant)
    }
}

/// The ISO day of the week: Monday is `1` and Sunday is `7`.
#[derive(Clone, Debug)]
pub(crate) struct DayOfWeekField {
    days: Arc<dyn DurationField>,
    weeks: Arc<dyn DurationField>,
}

impl DayOfWeekField {
    pub(crate) fn new(
        days: Arc<dyn DurationField>,
        weeks: Arc<dyn DurationField>,
    ) -> DayOfWeekField {
        DayOfWeekField { days, weeks }
    }
}

impl DateTimeField for DayOfWeekField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::DayOfWeek
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.days
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.weeks)
    }

    fn get(&self, instant: i64) -> i32 {
        cal::day_of_week_of_day(cal::epoch_day_of(instant))
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let dow = check_value(self, instant, value)?;
        set_by_days(instant, dow - self.get(instant))
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        7
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        cal::day_floor(instant)
    }
}

/// The week-year, in astronomical numbering.
#[derive(Clone, Debug)]
pub(crate) struct WeekyearField {
    cal: Calendar,
    weekyears: Arc<dyn DurationField>,
    min: i32,
    max: i32,
}

impl WeekyearField {
    pub(crate) fn new(
        cal: Calendar,
        weekyears: Arc<dyn DurationField>,
    ) -> WeekyearField {
        let min = cal::weekyear_of_day(&*cal, cal::epoch_day_of(i64::MIN));
        let max = cal::weekyear_of_day(&*cal, cal::epoch_day_of(i64::MAX));
        WeekyearField { cal, weekyears, min, max }
    }
}

impl DateTimeField for WeekyearField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::Weekyear
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.weekyears
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        None
    }

    fn get(&self, instant: i64) -> i32 {
        cal::weekyear_of_day(&*self.cal, cal::epoch_day_of(instant))
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let weekyear = check_value(self, instant, value)?;
        cal::with_weekyear(&*self.cal, instant, weekyear)
    }

    fn minimum_value(&self) -> i32 {
        self.min
    }

    fn maximum_value(&self) -> i32 {
        self.max
    }

    fn is_leap(&self, instant: i64) -> bool {
        cal::weeks_in_weekyear(&*self.cal, self.get(instant)) > 52
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let start = cal::weekyear_start_day(&*self.cal, self.get(instant));
        cal::instant_of(start, 0)
    }
}

/// The week of the week-year, starting at `1`.
#[derive(Clone, Debug)]
pub(crate) struct WeekOfWeekyearField {
    cal: Calendar,
    weeks: Arc<dyn DurationField>,
    weekyears: Arc<dyn DurationField>,
}

impl WeekOfWeekyearField {
    pub(crate) fn new(
        cal: Calendar,
        weeks: Arc<dyn DurationField>,
        weekyears: Arc<dyn DurationField>,
    ) -> WeekOfWeekyearField {
        WeekOfWeekyearField { cal, weeks, weekyears }
    }
}

impl DateTimeField for WeekOfWeekyearField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::WeekOfWeekyear
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.weeks
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.weekyears)
    }

    fn get(&self, instant: i64) -> i32 {
        cal::week_of_weekyear_of_day(&*self.cal, cal::epoch_day_of(instant))
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let week = check_value(self, instant, value)?;
        set_by_days(instant, (week - self.get(instant)) * 7)
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        53
    }

    fn maximum_value_at(&self, instant: i64) -> i32 {
        let day = cal::epoch_day_of(instant);
        let weekyear = cal::weekyear_of_day(&*self.cal, day);
        cal::weeks_in_weekyear(&*self.cal, weekyear)
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let day = cal::epoch_day_of(instant);
        let monday = day - i64::from(cal::day_of_week_of_day(day) - 1);
        cal::instant_of(monday, 0)
    }
}

/// The era: `0` before year one (BCE) and `1` from year one on (CE).
///
/// There is no era unit, so adding to this field is unsupported. Setting it
/// mirrors the year around year one: the year `2024` becomes `-2023`, which
/// is 2024 BCE.
#[derive(Clone, Debug)]
pub(crate) struct EraField {
    cal: Calendar,
    eras: Arc<dyn DurationField>,
}

impl EraField {
    pub(crate) const BCE: i32 = 0;
    pub(crate) const CE: i32 = 1;

    pub(crate) fn new(
        cal: Calendar,
        eras: Arc<dyn DurationField>,
    ) -> EraField {
        EraField { cal, eras }
    }

    fn year_one_start(&self) -> Result<i64, Error> {
        cal::instant_of(self.cal.year_start_day(1), 0)
    }
}

impl DateTimeField for EraField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::Era
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.eras
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        None
    }

    fn get(&self, instant: i64) -> i32 {
        if cal::year_of(&*self.cal, instant) <= 0 {
            EraField::BCE
        } else {
            EraField::CE
        }
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let era = check_value(self, instant, value)?;
        if era == self.get(instant) {
            return Ok(instant);
        }
        let ymd = cal::ymd_of(&*self.cal, instant);
        let year = arith::to_i32(1 - i64::from(ymd.year), "set era")?;
        let (min, max) = cal::year_bounds(&*self.cal);
        if !(min..=max).contains(&year) {
            return Err(Error::overflow("set era"));
        }
        cal::with_year_month(&*self.cal, instant, year, ymd.month)
    }

    fn minimum_value(&self) -> i32 {
        EraField::BCE
    }

    fn maximum_value(&self) -> i32 {
        EraField::CE
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        if self.get(instant) == EraField::CE {
            self.year_one_start()
        } else {
            Ok(i64::MIN)
        }
    }

    fn round_ceiling(&self, instant: i64) -> Result<i64, Error> {
        if self.get(instant) == EraField::BCE {
            self.year_one_start()
        } else {
            Ok(i64::MAX)
        }
    }
}

/// The year within the era, starting at `1` in both eras.
#[derive(Clone, Debug)]
pub(crate) struct YearOfEraField {
    cal: Calendar,
    years: Arc<dyn DurationField>,
    eras: Arc<dyn DurationField>,
    max_ce: i32,
    max_bce: i32,
}

impl YearOfEraField {
    pub(crate) fn new(
        cal: Calendar,
        years: Arc<dyn DurationField>,
        eras: Arc<dyn DurationField>,
    ) -> YearOfEraField {
        let (min, max) = cal::year_bounds(&*cal);
        let (max_ce, max_bce) = (max, 1 - min);
        YearOfEraField { cal, years, eras, max_ce, max_bce }
    }
}

impl DateTimeField for YearOfEraField {
    fn field_type(&self) -> DateTimeFieldType {
        DateTimeFieldType::YearOfEra
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.years
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.eras)
    }

    fn get(&self, instant: i64) -> i32 {
        let year = cal::year_of(&*self.cal, instant);
        if year <= 0 {
            1 - year
        } else {
            year
        }
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let year_of_era = check_value(self, instant, value)?;
        let ymd = cal::ymd_of(&*self.cal, instant);
        let year = if ymd.year <= 0 { 1 - year_of_era } else { year_of_era };
        cal::with_year_month(&*self.cal, instant, year, ymd.month)
    }

    fn minimum_value(&self) -> i32 {
        1
    }

    fn maximum_value(&self) -> i32 {
        self.max_ce.max(self.max_bce)
    }

    fn maximum_value_at(&self, instant: i64) -> i32 {
        if cal::year_of(&*self.cal, instant) <= 0 {
            self.max_bce
        } else {
            self.max_ce
        }
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let start = self.cal.year_start_day(cal::year_of(&*self.cal, instant));
        cal::instant_of(start, 0)
    }
}

/// Moves `instant` by a whole number of days.
fn set_by_days(instant: i64, days: i32) -> Result<i64, Error> {
    let millis = arith::mul(i64::from(days), MILLIS_PER_DAY, "set day")?;
    arith::add(instant, millis, "set day")
}
