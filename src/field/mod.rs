/*!
Date-time fields: calendar-aware accessors for one component of an instant.

A [`DateTimeField`] reads and writes a single component, such as the month
of the year or the minute of the hour, of a millisecond instant. Each field
is built on a [`DurationField`] (the unit it counts) and usually has a
*range* duration field (the next larger unit it rolls into). For example,
day-of-month counts days and rolls into months.

# Leniency

When a value given to [`DateTimeField::set`] is outside of a field's
bounds, what happens depends on the field's [`FieldCategory`]:

* Every field first validates the value against its absolute bounds
(`minimum_value()..=maximum_value()`), which do not depend on the instant.
Values outside them are always an error.
* [`FieldCategory::Date`] fields then *clamp* the value to the bounds that
apply at the instant being modified. Setting day-of-month to `31` in
February yields the last day of February. Changing the year or month of
February 29 to a non-leap year yields February 28.
* [`FieldCategory::Time`] fields never clamp. A value outside of the
instant-dependent bounds is an error.

Duration arithmetic ([`DateTimeField::add`]) never clamps the instant, but
date fields that carry into larger units (adding a month to January 31)
clamp the day of month in the result, in the same way as `set`.
*/

use std::sync::Arc;

use crate::{
    duration::{DurationField, DurationFieldType},
    error::field::Error as FieldError,
    util::arith,
    Error,
};

pub use self::{
    composite::{DividedDateTimeField, RemainderDateTimeField},
    precise::PreciseDateTimeField,
    zoned::{ZonedDateTimeField, ZonedDurationField},
};

mod composite;
mod precise;
mod zoned;

/// The symbolic type of a date-time field.
///
/// Each type names the unit the field counts and the unit it rolls into,
/// independent of any calendar system.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum DateTimeFieldType {
    Era,
    YearOfEra,
    CenturyOfEra,
    YearOfCentury,
    Year,
    DayOfYear,
    MonthOfYear,
    DayOfMonth,
    Weekyear,
    WeekOfWeekyear,
    DayOfWeek,
    HalfdayOfDay,
    HourOfHalfday,
    HourOfDay,
    MinuteOfDay,
    MinuteOfHour,
    SecondOfDay,
    SecondOfMinute,
    MillisOfDay,
    MillisOfSecond,
}

impl DateTimeFieldType {
    /// Every date-time field type.
    pub const ALL: [DateTimeFieldType; 20] = [
        DateTimeFieldType::Era,
        DateTimeFieldType::YearOfEra,
        DateTimeFieldType::CenturyOfEra,
        DateTimeFieldType::YearOfCentury,
        DateTimeFieldType::Year,
        DateTimeFieldType::DayOfYear,
        DateTimeFieldType::MonthOfYear,
        DateTimeFieldType::DayOfMonth,
        DateTimeFieldType::Weekyear,
        DateTimeFieldType::WeekOfWeekyear,
        DateTimeFieldType::DayOfWeek,
        DateTimeFieldType::HalfdayOfDay,
        DateTimeFieldType::HourOfHalfday,
        DateTimeFieldType::HourOfDay,
        DateTimeFieldType::MinuteOfDay,
        DateTimeFieldType::MinuteOfHour,
        DateTimeFieldType::SecondOfDay,
        DateTimeFieldType::SecondOfMinute,
        DateTimeFieldType::MillisOfDay,
        DateTimeFieldType::MillisOfSecond,
    ];

    /// Returns the conventional name of this field type, e.g.
    /// `dayOfMonth`.
    pub fn name(self) -> &'static str {
        use self::DateTimeFieldType::*;

        match self {
            Era => "era",
            YearOfEra => "yearOfEra",
            CenturyOfEra => "centuryOfEra",
            YearOfCentury => "yearOfCentury",
            Year => "year",
            DayOfYear => "dayOfYear",
            MonthOfYear => "monthOfYear",
            DayOfMonth => "dayOfMonth",
            Weekyear => "weekyear",
            WeekOfWeekyear => "weekOfWeekyear",
            DayOfWeek => "dayOfWeek",
            HalfdayOfDay => "halfdayOfDay",
            HourOfHalfday => "hourOfHalfday",
            HourOfDay => "hourOfDay",
            MinuteOfDay => "minuteOfDay",
            MinuteOfHour => "minuteOfHour",
            SecondOfDay => "secondOfDay",
            SecondOfMinute => "secondOfMinute",
            MillisOfDay => "millisOfDay",
            MillisOfSecond => "millisOfSecond",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The unit counted by fields of this type.
    pub fn duration_type(self) -> DurationFieldType {
        use self::{DateTimeFieldType::*, DurationFieldType as D};

        match self {
            Era => D::Eras,
            YearOfEra | Year | YearOfCentury => D::Years,
            CenturyOfEra => D::Centuries,
            DayOfYear | DayOfMonth | DayOfWeek => D::Days,
            MonthOfYear => D::Months,
            Weekyear => D::WeekYears,
            WeekOfWeekyear => D::Weeks,
            HalfdayOfDay => D::HalfDays,
            HourOfHalfday | HourOfDay => D::Hours,
            MinuteOfDay | MinuteOfHour => D::Minutes,
            SecondOfDay | SecondOfMinute => D::Seconds,
            MillisOfDay | MillisOfSecond => D::Millis,
        }
    }

    /// The unit that fields of this type roll into, if any.
    ///
    /// Only the unbounded fields (era, year and weekyear) have no range.
    pub fn range_type(self) -> Option<DurationFieldType> {
        use self::{DateTimeFieldType::*, DurationFieldType as D};

        Some(match self {
            Era | Year | Weekyear => return None,
            YearOfEra | CenturyOfEra => D::Eras,
            YearOfCentury => D::Centuries,
            DayOfYear | MonthOfYear => D::Years,
            DayOfMonth => D::Months,
            WeekOfWeekyear => D::WeekYears,
            DayOfWeek => D::Weeks,
            HalfdayOfDay | HourOfDay | MinuteOfDay | SecondOfDay
            | MillisOfDay => D::Days,
            HourOfHalfday => D::HalfDays,
            MinuteOfHour => D::Hours,
            SecondOfMinute => D::Minutes,
            MillisOfSecond => D::Seconds,
        })
    }

    /// Whether this field type is a date field or a time field. This
    /// determines its leniency policy.
    pub fn category(self) -> FieldCategory {
        if self.duration_type() >= DurationFieldType::Days {
            FieldCategory::Date
        } else {
            FieldCategory::Time
        }
    }
}

impl std::fmt::Display for DateTimeFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The category of a field, which determines how out-of-range values given
/// to `set` are treated.
///
/// See the [module documentation](self) for the full policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldCategory {
    /// Fields counting days or longer units. These clamp values to the
    /// bounds in effect at the instant being modified.
    Date,
    /// Fields counting units shorter than a day. These never clamp.
    Time,
}

/// A calendar-aware accessor and mutator for one component of an instant.
///
/// Instants are milliseconds since 1970-01-01T00:00:00Z. Field values are
/// `i32`. Amounts added to a field are `i64`.
///
/// Implementations are immutable. A [`Chronology`](crate::chrono::Chronology)
/// owns one implementation per [`DateTimeFieldType`] it supports.
///
/// # Range
///
/// Every `i64` instant is accepted, but fields of a chronology in a time
/// zone other than UTC work on local time, which is the instant shifted by
/// the zone's offset. Within one offset of either end of the `i64` range,
/// the local instant doesn't exist. There, `get` saturates while `set`,
/// `add` and the rounding methods return an error for which
/// [`Error::is_overflow`](crate::Error::is_overflow) is `true`. For
/// example, nothing can be set at `i64::MAX` in a `+01:00` zone.
pub trait DateTimeField: std::fmt::Debug + Send + Sync {
    /// The symbolic type of this field.
    fn field_type(&self) -> DateTimeFieldType;

    /// The unit this field counts.
    fn duration_field(&self) -> &Arc<dyn DurationField>;

    /// The unit this field rolls into, if it has one.
    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>>;

    /// Returns the value of this field at the given instant.
    fn get(&self, instant: i64) -> i32;

    /// Returns a new instant with this field set to `value`.
    ///
    /// Smaller fields are preserved where possible. The value is validated
    /// according to this field's leniency policy (see the
    /// [module documentation](self)).
    fn set(&self, instant: i64, value: i32) -> Result<i64, Error>;

    /// Adds `amount` of this field's unit to `instant`. Larger fields change
    /// as needed. For example, adding one month to December changes the
    /// year.
    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        self.duration_field().add(instant, amount)
    }

    /// Adds `amount` to this field's value, wrapping within the field's
    /// bounds at `instant` without changing any larger field.
    ///
    /// For example, adding one month wrapped to December yields January of
    /// the same year.
    fn add_wrapped(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let value = arith::wrap_add(
            self.get(instant),
            amount,
            self.minimum_value_at(instant),
            self.maximum_value_at(instant),
        );
        self.set(instant, value)
    }

    /// Returns the number of whole units of this field from `subtrahend` to
    /// `minuend`. See [`DurationField::difference`].
    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        self.duration_field().difference(minuend, subtrahend)
    }

    /// The smallest value this field can take at any instant.
    fn minimum_value(&self) -> i32;

    /// The largest value this field can take at any instant.
    fn maximum_value(&self) -> i32;

    /// The smallest value this field can take at the given instant.
    fn minimum_value_at(&self, _instant: i64) -> i32 {
        self.minimum_value()
    }

    /// The largest value this field can take at the given instant. For
    /// example, day-of-month returns `29` during a leap February.
    fn maximum_value_at(&self, _instant: i64) -> i32 {
        self.maximum_value()
    }

    /// Whether the value at `instant` is a leap value, e.g. a leap year for
    /// year fields or February 29 for day-of-month.
    fn is_leap(&self, _instant: i64) -> bool {
        false
    }

    /// Returns the first instant having the same value of this field (and
    /// of every larger field) as `instant`.
    fn round_floor(&self, instant: i64) -> Result<i64, Error>;

    /// Returns the first instant at or after `instant` at which this field
    /// begins a new value.
    fn round_ceiling(&self, instant: i64) -> Result<i64, Error> {
        let floor = self.round_floor(instant)?;
        if floor == instant {
            return Ok(instant);
        }
        self.add(floor, 1)
    }

    /// Returns the milliseconds elapsed since `round_floor(instant)`.
    fn remainder(&self, instant: i64) -> Result<i64, Error> {
        let floor = self.round_floor(instant)?;
        arith::sub(instant, floor, "field remainder")
    }
}

/// Validates `value` for `field` at `instant` according to the field's
/// leniency policy, and returns the value that should actually be set.
pub(crate) fn check_value<F: DateTimeField + ?Sized>(
    field: &F,
    instant: i64,
    value: i32,
) -> Result<i32, Error> {
    let ty = field.field_type();
    let (min, max) = (field.minimum_value(), field.maximum_value());
    if !(min..=max).contains(&value) {
        return Err(
            FieldError::out_of_range(ty.name(), value, min, max).into()
        );
    }
    let lo = field.minimum_value_at(instant);
    let hi = field.maximum_value_at(instant);
    match ty.category() {
        FieldCategory::Date => Ok(value.clamp(lo, hi)),
        FieldCategory::Time if (lo..=hi).contains(&value) => Ok(value),
        FieldCategory::Time => {
            Err(FieldError::out_of_range(ty.name(), value, lo, hi).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        use self::DateTimeFieldType::*;

        for ty in
            [Era, Year, DayOfMonth, DayOfWeek, Weekyear, WeekOfWeekyear]
        {
            assert_eq!(ty.category(), FieldCategory::Date, "{ty}");
        }
        for ty in [HalfdayOfDay, HourOfDay, MinuteOfHour, MillisOfSecond] {
            assert_eq!(ty.category(), FieldCategory::Time, "{ty}");
        }
    }

    #[test]
    fn range_is_longer_than_unit() {
        for ty in DateTimeFieldType::ALL {
            if let Some(range) = ty.range_type() {
                assert!(range > ty.duration_type(), "{ty}");
            }
        }
    }
}
