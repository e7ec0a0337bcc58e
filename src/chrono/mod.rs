/*!
Chronologies: a calendar system bound to a time zone.

A [`Chronology`] owns one [`DateTimeField`] for every
[`DateTimeFieldType`] its calendar system defines, and one
[`DurationField`] for every [`DurationFieldType`]. It is the entry point for
reading and writing the components of an instant.

```
use calendrical::{chrono::Chronology, field::DateTimeField};

let chrono = Chronology::iso_utc();
// 2002-03-31T01:00:00Z
let instant = 1_017_536_400_000;
assert_eq!(chrono.year().get(instant), 2002);
assert_eq!(chrono.month_of_year().get(instant), 3);
assert_eq!(chrono.day_of_month().get(instant), 31);
assert_eq!(chrono.hour_of_day().get(instant), 1);

// Moving to April clamps the day of month to April 30.
let april = chrono.month_of_year().set(instant, 4)?;
assert_eq!(chrono.day_of_month().get(april), 30);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Building a chronology

[`Chronology::new`] starts from the standard field set for a calendar
system: calendar-driven fields for dates, precise fields for times of day,
and divided and remainder fields for centuries and half-days. The calendar
system may then adjust the set through [`CalendarSystem::assemble`]. When
the time zone isn't UTC, every field and duration field is finally wrapped
so that it operates on local time.
*/

use std::sync::Arc;

use crate::{
    duration::{
        DurationField, DurationFieldType, PreciseDurationField,
        UnsupportedDurationField,
    },
    error::field::Error as FieldError,
    field::{
        DateTimeField, DateTimeFieldType, DividedDateTimeField,
        PreciseDateTimeField, RemainderDateTimeField, ZonedDateTimeField,
        ZonedDurationField,
    },
    tz::TimeZone,
    util::arith::{MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND},
    Error,
};

use self::{calendar::YearMonthDay, fields::*};

pub use self::{
    calendar::CalendarSystem, gregorian::GregorianCalendar,
    julian::JulianCalendar,
};

pub(crate) mod calendar;
mod fields;
mod gregorian;
mod julian;

/// A calendar system bound to a time zone.
///
/// Chronologies are immutable and cheap to clone. Two chronologies are
/// equal when their calendar systems have the same identifier and their
/// time zones are equal.
#[derive(Clone)]
pub struct Chronology {
    inner: Arc<ChronologyInner>,
}

struct ChronologyInner {
    calendar: Arc<dyn CalendarSystem>,
    zone: TimeZone,
    fields: Fields,
    year: Arc<dyn DateTimeField>,
    month_of_year: Arc<dyn DateTimeField>,
    day_of_month: Arc<dyn DateTimeField>,
    hour_of_day: Arc<dyn DateTimeField>,
    minute_of_hour: Arc<dyn DateTimeField>,
    second_of_minute: Arc<dyn DateTimeField>,
    millis_of_second: Arc<dyn DateTimeField>,
}

impl Chronology {
    /// Builds a chronology for the given calendar system and time zone.
    ///
    /// # Errors
    ///
    /// This returns an error if the calendar system's
    /// [`assemble`](CalendarSystem::assemble) hook fails, or if it removes
    /// one of the fields every chronology must have: year, month-of-year,
    /// day-of-month, hour-of-day, minute-of-hour, second-of-minute and
    /// millis-of-second.
    pub fn new(
        calendar: Arc<dyn CalendarSystem>,
        zone: TimeZone,
    ) -> Result<Chronology, Error> {
        let mut fields = Fields::standard(&calendar)?;
        calendar.assemble(&mut fields)?;
        if !zone.is_utc() {
            fields = fields.zoned(&zone);
        }
        let required = |ty: DateTimeFieldType| -> Result<_, Error> {
            fields.field(ty).cloned().ok_or_else(|| {
                Error::from(FieldError::Unsupported { field: ty.name() })
            })
        };
        let inner = ChronologyInner {
            year: required(DateTimeFieldType::Year)?,
            month_of_year: required(DateTimeFieldType::MonthOfYear)?,
            day_of_month: required(DateTimeFieldType::DayOfMonth)?,
            hour_of_day: required(DateTimeFieldType::HourOfDay)?,
            minute_of_hour: required(DateTimeFieldType::MinuteOfHour)?,
            second_of_minute: required(DateTimeFieldType::SecondOfMinute)?,
            millis_of_second: required(DateTimeFieldType::MillisOfSecond)?,
            calendar,
            zone,
            fields,
        };
        Ok(Chronology { inner: Arc::new(inner) })
    }

    /// The ISO-8601 chronology (the proleptic Gregorian calendar) in the
    /// given time zone.
    pub fn iso(zone: TimeZone) -> Chronology {
        Chronology::builtin(Arc::new(GregorianCalendar), zone)
    }

    /// The ISO-8601 chronology in UTC.
    pub fn iso_utc() -> Chronology {
        Chronology::iso(TimeZone::UTC)
    }

    /// The proleptic Julian chronology in the given time zone.
    pub fn julian(zone: TimeZone) -> Chronology {
        Chronology::builtin(Arc::new(JulianCalendar), zone)
    }

    fn builtin(
        calendar: Arc<dyn CalendarSystem>,
        zone: TimeZone,
    ) -> Chronology {
        // OK because the built-in calendars keep the standard field set,
        // which always builds.
        Chronology::new(calendar, zone).expect("built-in chronology")
    }

    /// Returns this chronology's calendar system.
    pub fn calendar(&self) -> &Arc<dyn CalendarSystem> {
        &self.inner.calendar
    }

    /// Returns the time zone this chronology is bound to.
    pub fn zone(&self) -> &TimeZone {
        &self.inner.zone
    }

    /// Returns the same calendar system bound to a different time zone.
    ///
    /// If the zone is equal to this chronology's zone, this returns a clone
    /// of this chronology.
    pub fn with_zone(&self, zone: TimeZone) -> Result<Chronology, Error> {
        if zone == self.inner.zone {
            return Ok(self.clone());
        }
        Chronology::new(Arc::clone(&self.inner.calendar), zone)
    }

    /// Returns the same calendar system in UTC.
    pub fn with_utc(&self) -> Result<Chronology, Error> {
        self.with_zone(TimeZone::UTC)
    }

    /// Returns the field of the given type.
    ///
    /// # Errors
    ///
    /// This returns an error for which
    /// [`Error::is_unsupported_field`](crate::Error::is_unsupported_field)
    /// returns `true` if this chronology's calendar system doesn't define
    /// the field.
    pub fn field(
        &self,
        ty: DateTimeFieldType,
    ) -> Result<&Arc<dyn DateTimeField>, Error> {
        self.inner.fields.field(ty).ok_or_else(|| {
            Error::from(FieldError::Unsupported { field: ty.name() })
        })
    }

    /// Returns the duration field of the given type.
    ///
    /// Some duration fields exist but don't support arithmetic. The eras
    /// duration field of the ISO chronology is one example.
    pub fn duration_field(
        &self,
        ty: DurationFieldType,
    ) -> Result<&Arc<dyn DurationField>, Error> {
        self.inner.fields.duration(ty).ok_or_else(|| {
            Error::from(FieldError::Unsupported { field: ty.name() })
        })
    }

    /// The year field, in astronomical numbering.
    pub fn year(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.year
    }

    /// The month-of-year field, from `1` to `12` in ISO.
    pub fn month_of_year(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.month_of_year
    }

    /// The day-of-month field.
    pub fn day_of_month(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.day_of_month
    }

    /// The hour-of-day field, from `0` to `23`.
    pub fn hour_of_day(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.hour_of_day
    }

    /// The minute-of-hour field, from `0` to `59`.
    pub fn minute_of_hour(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.minute_of_hour
    }

    /// The second-of-minute field, from `0` to `59`.
    pub fn second_of_minute(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.second_of_minute
    }

    /// The millis-of-second field, from `0` to `999`.
    pub fn millis_of_second(&self) -> &Arc<dyn DateTimeField> {
        &self.inner.millis_of_second
    }

    /// Sets each of the given field values on `base`, from the largest
    /// field to the smallest.
    ///
    /// The values may be given in any order. They are applied in
    /// descending order of the field's unit (and then of its range), so
    /// that each value is validated against the larger fields already
    /// resolved. Setting day-of-month to `31` together with month-of-year
    /// `2` therefore clamps to the last day of February, no matter which
    /// pair comes first.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::{
    ///     chrono::Chronology,
    ///     field::{DateTimeField, DateTimeFieldType as T},
    /// };
    ///
    /// let chrono = Chronology::iso_utc();
    /// let instant = chrono.resolve(0, &[
    ///     (T::DayOfMonth, 31),
    ///     (T::MonthOfYear, 2),
    ///     (T::Year, 2024),
    ///     (T::HourOfDay, 6),
    /// ])?;
    /// assert_eq!(instant, chrono.date_time_millis(2024, 2, 29, 6, 0, 0, 0)?);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn resolve(
        &self,
        base: i64,
        values: &[(DateTimeFieldType, i32)],
    ) -> Result<i64, Error> {
        let mut sorted = values.to_vec();
        sorted.sort_by_key(|&(ty, _)| {
            let range = ty.range_type().map_or(usize::MAX, |r| r.index());
            std::cmp::Reverse((ty.duration_type().index(), range))
        });
        let mut instant = base;
        for (ty, value) in sorted {
            instant = self.field(ty)?.set(instant, value)?;
        }
        Ok(instant)
    }

    /// Returns the instant at the given local date and time in this
    /// chronology's time zone.
    ///
    /// Unlike [`resolve`](Chronology::resolve), every value is validated
    /// strictly: February 30 is an error rather than being clamped. A
    /// local time that doesn't exist because of a time zone transition is
    /// also an error. Ambiguous local times resolve to the earlier instant.
    ///
    /// # Errors
    ///
    /// Any invalid value returns an error for which
    /// [`Error::is_invalid_field_value`](crate::Error::is_invalid_field_value)
    /// returns `true`. Dates that are valid but can't be represented
    /// return an overflow error.
    #[allow(clippy::too_many_arguments)]
    pub fn date_time_millis(
        &self,
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
        millis: i32,
    ) -> Result<i64, Error> {
        let cal = &*self.inner.calendar;
        let (min_year, max_year) = calendar::year_bounds(cal);
        check_strict(DateTimeFieldType::Year, year, min_year, max_year)?;
        let months = cal.months_in_year();
        check_strict(DateTimeFieldType::MonthOfYear, month, 1, months)?;
        let days = cal.days_in_year_month(year, month);
        check_strict(DateTimeFieldType::DayOfMonth, day, 1, days)?;
        check_strict(DateTimeFieldType::HourOfDay, hour, 0, 23)?;
        check_strict(DateTimeFieldType::MinuteOfHour, minute, 0, 59)?;
        check_strict(DateTimeFieldType::SecondOfMinute, second, 0, 59)?;
        check_strict(DateTimeFieldType::MillisOfSecond, millis, 0, 999)?;

        let day = calendar::epoch_day(cal, YearMonthDay { year, month, day });
        let millis_of_day = i64::from(hour) * MILLIS_PER_HOUR
            + i64::from(minute) * MILLIS_PER_MINUTE
            + i64::from(second) * MILLIS_PER_SECOND
            + i64::from(millis);
        let local = calendar::instant_of(day, millis_of_day)?;
        if self.inner.zone.is_utc() {
            return Ok(local);
        }
        self.inner.zone.convert_local_to_utc(local, true)
    }
}

impl PartialEq for Chronology {
    fn eq(&self, rhs: &Chronology) -> bool {
        Arc::ptr_eq(&self.inner, &rhs.inner)
            || (self.inner.calendar.id() == rhs.inner.calendar.id()
                && self.inner.zone == rhs.inner.zone)
    }
}

impl Eq for Chronology {}

impl std::fmt::Debug for Chronology {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Chronology")
            .field("calendar", &self.inner.calendar.id())
            .field("zone", &self.inner.zone.id())
            .finish()
    }
}

fn check_strict(
    ty: DateTimeFieldType,
    value: i32,
    min: i32,
    max: i32,
) -> Result<(), Error> {
    if !(min..=max).contains(&value) {
        let err = FieldError::out_of_range(ty.name(), value, min, max);
        return Err(err.into());
    }
    Ok(())
}

/// The field set of a chronology under construction.
///
/// A [`CalendarSystem`] receives this in its
/// [`assemble`](CalendarSystem::assemble) hook and may replace or remove
/// entries. Fields are indexed by their own
/// [`field_type`](DateTimeField::field_type).
#[derive(Clone, Debug, Default)]
pub struct Fields {
    durations: [Option<Arc<dyn DurationField>>; 12],
    fields: [Option<Arc<dyn DateTimeField>>; 20],
}

impl Fields {
    /// Returns the field of the given type, if present.
    pub fn field(
        &self,
        ty: DateTimeFieldType,
    ) -> Option<&Arc<dyn DateTimeField>> {
        self.fields[ty.index()].as_ref()
    }

    /// Adds `field`, replacing any existing field of the same type.
    pub fn set_field(&mut self, field: Arc<dyn DateTimeField>) {
        let i = field.field_type().index();
        self.fields[i] = Some(field);
    }

    /// Removes and returns the field of the given type.
    pub fn remove_field(
        &mut self,
        ty: DateTimeFieldType,
    ) -> Option<Arc<dyn DateTimeField>> {
        self.fields[ty.index()].take()
    }

    /// Returns the duration field of the given type, if present.
    pub fn duration(
        &self,
        ty: DurationFieldType,
    ) -> Option<&Arc<dyn DurationField>> {
        self.durations[ty.index()].as_ref()
    }

    /// Adds `field`, replacing any existing duration field of the same
    /// type.
    pub fn set_duration(&mut self, field: Arc<dyn DurationField>) {
        let i = field.field_type().index();
        self.durations[i] = Some(field);
    }

    /// Builds the standard field set over the given calendar system.
    pub(crate) fn standard(
        cal: &Arc<dyn CalendarSystem>,
    ) -> Result<Fields, Error> {
        use self::{DateTimeFieldType as F, DurationFieldType as D};

        fn precise(
            ty: DateTimeFieldType,
            unit: &Arc<dyn DurationField>,
            range: &Arc<dyn DurationField>,
        ) -> Result<Arc<dyn DateTimeField>, Error> {
            let field = PreciseDateTimeField::new(
                ty,
                Arc::clone(unit),
                Arc::clone(range),
            )?;
            Ok(Arc::new(field))
        }

        fn duration(
            field: impl DurationField + 'static,
        ) -> Arc<dyn DurationField> {
            Arc::new(field)
        }

        let millis = duration(PreciseDurationField::MILLIS);
        let seconds = duration(PreciseDurationField::SECONDS);
        let minutes = duration(PreciseDurationField::MINUTES);
        let hours = duration(PreciseDurationField::HOURS);
        let days = duration(PreciseDurationField::DAYS);
        let weeks = duration(PreciseDurationField::WEEKS);
        let months = duration(MonthsDurationField::new(Arc::clone(cal)));
        let years = duration(YearsDurationField::new(Arc::clone(cal)));
        let weekyears = duration(WeekyearsDurationField::new(Arc::clone(cal)));
        let eras = duration(UnsupportedDurationField::new(D::Eras));

        let mut set = Fields::default();
        for d in [
            &millis, &seconds, &minutes, &hours, &days, &weeks, &months,
            &years, &weekyears, &eras,
        ] {
            set.set_duration(Arc::clone(d));
        }

        set.set_field(precise(F::MillisOfSecond, &millis, &seconds)?);
        set.set_field(precise(F::MillisOfDay, &millis, &days)?);
        set.set_field(precise(F::SecondOfMinute, &seconds, &minutes)?);
        set.set_field(precise(F::SecondOfDay, &seconds, &days)?);
        set.set_field(precise(F::MinuteOfHour, &minutes, &hours)?);
        set.set_field(precise(F::MinuteOfDay, &minutes, &days)?);
        let hour_of_day = precise(F::HourOfDay, &hours, &days)?;
        set.set_field(Arc::clone(&hour_of_day));

        // Half-days are hours divided by 12, and the hour of the half-day is
        // what remains.
        let halfday_of_day = DividedDateTimeField::new(
            F::HalfdayOfDay,
            hour_of_day,
            D::HalfDays,
            12,
        )?;
        let hour_of_halfday = RemainderDateTimeField::from_divided(
            F::HourOfHalfday,
            &halfday_of_day,
        );
        set.set_duration(Arc::clone(halfday_of_day.duration_field()));
        set.set_field(Arc::new(halfday_of_day));
        set.set_field(Arc::new(hour_of_halfday));

        set.set_field(Arc::new(YearField::new(
            Arc::clone(cal),
            Arc::clone(&years),
        )));
        set.set_field(Arc::new(MonthOfYearField::new(
            Arc::clone(cal),
            Arc::clone(&months),
            Arc::clone(&years),
        )));
        set.set_field(Arc::new(DayOfMonthField::new(
            Arc::clone(cal),
            Arc::clone(&days),
            Arc::clone(&months),
        )));
        set.set_field(Arc::new(DayOfYearField::new(
            Arc::clone(cal),
            Arc::clone(&days),
            Arc::clone(&years),
        )));
        set.set_field(Arc::new(DayOfWeekField::new(
            Arc::clone(&days),
            Arc::clone(&weeks),
        )));
        set.set_field(Arc::new(WeekyearField::new(
            Arc::clone(cal),
            Arc::clone(&weekyears),
        )));
        set.set_field(Arc::new(WeekOfWeekyearField::new(
            Arc::clone(cal),
            Arc::clone(&weeks),
            Arc::clone(&weekyears),
        )));
        set.set_field(Arc::new(EraField::new(
            Arc::clone(cal),
            Arc::clone(&eras),
        )));
        let year_of_era: Arc<dyn DateTimeField> = Arc::new(
            YearOfEraField::new(Arc::clone(cal), Arc::clone(&years), eras),
        );
        set.set_field(Arc::clone(&year_of_era));

        let century_of_era = DividedDateTimeField::new(
            F::CenturyOfEra,
            year_of_era,
            D::Centuries,
            100,
        )?;
        let year_of_century = RemainderDateTimeField::from_divided(
            F::YearOfCentury,
            &century_of_era,
        );
        set.set_duration(Arc::clone(century_of_era.duration_field()));
        set.set_field(Arc::new(century_of_era));
        set.set_field(Arc::new(year_of_century));
        Ok(set)
    }

    /// Returns this field set with every field adjusted for `zone`.
    ///
    /// Duration fields shared between several fields stay shared after
    /// wrapping. Unsupported duration fields are kept as is.
    fn zoned(&self, zone: &TimeZone) -> Fields {
        let mut zoned = Fields::default();
        let durations = self.durations.iter().zip(zoned.durations.iter_mut());
        for (orig, new) in durations {
            *new = orig.as_ref().map(|d| zone_duration(d, zone));
        }
        let convert = |d: &Arc<dyn DurationField>| -> Arc<dyn DurationField> {
            self.durations
                .iter()
                .zip(zoned.durations.iter())
                .find_map(|(orig, new)| match (orig, new) {
                    (Some(orig), Some(new)) if same(orig, d) => {
                        Some(Arc::clone(new))
                    }
                    _ => None,
                })
                .unwrap_or_else(|| zone_duration(d, zone))
        };
        let mut fields: [Option<Arc<dyn DateTimeField>>; 20] =
            Default::default();
        for (orig, new) in self.fields.iter().zip(fields.iter_mut()) {
            *new = orig.as_ref().map(|f| {
                let duration = convert(f.duration_field());
                let range = f.range_duration_field().map(&convert);
                let field = ZonedDateTimeField::new(
                    Arc::clone(f),
                    zone.clone(),
                    duration,
                    range,
                );
                Arc::new(field) as Arc<dyn DateTimeField>
            });
        }
        zoned.fields = fields;
        zoned
    }
}

fn zone_duration(
    field: &Arc<dyn DurationField>,
    zone: &TimeZone,
) -> Arc<dyn DurationField> {
    if !field.is_supported() {
        return Arc::clone(field);
    }
    Arc::new(ZonedDurationField::new(Arc::clone(field), zone.clone()))
}

/// Whether two shared duration fields are the same allocation.
fn same(a: &Arc<dyn DurationField>, b: &Arc<dyn DurationField>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};

    use crate::tz::testdata;

    use super::*;

    // 2002-03-31T01:00:00Z, when London moves to summer time.
    const LONDON_SPRING: i64 = 1_017_536_400_000;

    fn london() -> Chronology {
        Chronology::iso(testdata::zone("Europe/London"))
    }

    #[test]
    fn core_fields() {
        let chrono = Chronology::iso_utc();
        assert_eq!(chrono.year().get(LONDON_SPRING), 2002);
        assert_eq!(chrono.month_of_year().get(LONDON_SPRING), 3);
        assert_eq!(chrono.day_of_month().get(LONDON_SPRING), 31);
        assert_eq!(chrono.hour_of_day().get(LONDON_SPRING), 1);
        assert_eq!(chrono.minute_of_hour().get(LONDON_SPRING), 0);
        assert_eq!(chrono.millis_of_second().get(-1), 999);
        assert_eq!(chrono.second_of_minute().get(-1), 59);
    }

    #[test]
    fn derived_fields() {
        let chrono = Chronology::iso_utc();
        let get = |ty, instant| chrono.field(ty).unwrap().get(instant);
        // 1969-12-31T23:00Z
        assert_eq!(get(DateTimeFieldType::HalfdayOfDay, -3_600_000), 1);
        assert_eq!(get(DateTimeFieldType::HourOfHalfday, -3_600_000), 11);
        assert_eq!(get(DateTimeFieldType::CenturyOfEra, 0), 19);
        assert_eq!(get(DateTimeFieldType::YearOfCentury, 0), 70);
        assert_eq!(get(DateTimeFieldType::DayOfWeek, 0), 4);
        assert_eq!(get(DateTimeFieldType::DayOfYear, -1), 365);
        assert_eq!(get(DateTimeFieldType::Era, 0), 1);

        let bce = chrono.date_time_millis(-1, 6, 1, 0, 0, 0, 0).unwrap();
        assert_eq!(get(DateTimeFieldType::Era, bce), 0);
        assert_eq!(get(DateTimeFieldType::YearOfEra, bce), 2);
    }

    #[test]
    fn century_of_negative_year_floors() {
        let chrono = Chronology::iso_utc();
        let century = DividedDateTimeField::new(
            DateTimeFieldType::CenturyOfEra,
            Arc::clone(chrono.year()),
            DurationFieldType::Centuries,
            100,
        )
        .unwrap();
        let instant = chrono.year().set(0, -50).unwrap();
        assert_eq!(century.get(instant), -1);
        let remainder = RemainderDateTimeField::from_divided(
            DateTimeFieldType::YearOfCentury,
            &century,
        );
        assert_eq!(remainder.get(instant), 50);
    }

    /// Year-of-era counts backwards before the common era, so a century
    /// there starts at its largest year-of-era.
    #[test]
    fn century_rounding_before_common_era() {
        let utc = Chronology::iso_utc();
        let plus1 = Chronology::iso(TimeZone::fixed(3_600_000).unwrap());
        for chrono in [utc, plus1] {
            let century = chrono.field(DateTimeFieldType::CenturyOfEra);
            let century = century.unwrap();
            let at = |y| chrono.date_time_millis(y, 1, 1, 0, 0, 0, 0).unwrap();

            // -0001 is 2 BCE. Its century runs from 99 BCE (-0098) through
            // 1 BCE (0000).
            let m = at(-1);
            assert_eq!(century.get(m), 0);
            assert_eq!(century.round_floor(m).unwrap(), at(-98));
            assert_eq!(century.round_ceiling(m).unwrap(), at(1));
            assert_eq!(century.remainder(m).unwrap(), m - at(-98));

            // 150 BCE is -0149, in the century from 199 BCE to 100 BCE.
            let m = at(-149) + 1;
            assert_eq!(century.get(m), 1);
            assert_eq!(century.round_floor(m).unwrap(), at(-198));
            assert_eq!(century.round_ceiling(m).unwrap(), at(-98));

            let m = at(2002) + 1;
            assert_eq!(century.round_floor(m).unwrap(), at(2000));
            assert_eq!(century.round_ceiling(m).unwrap(), at(2100));

            for m in [at(-1) + 1, at(-5000) - 1, at(1) - 1, 0] {
                let floor = century.round_floor(m).unwrap();
                assert!(floor <= m, "{chrono:?} at {m}: {floor}");
                assert_eq!(century.get(floor), century.get(m));
                assert!(century.remainder(m).unwrap() >= 0);
            }
        }
    }

    #[test]
    fn day_of_month_clamps_on_resolve() {
        let chrono = Chronology::iso_utc();
        let jan31 = chrono.date_time_millis(2023, 1, 31, 12, 0, 0, 0).unwrap();
        let feb = chrono.month_of_year().set(jan31, 2).unwrap();
        assert_eq!(chrono.day_of_month().get(feb), 28);
        assert_eq!(chrono.hour_of_day().get(feb), 12);

        let resolved = chrono
            .resolve(
                jan31,
                &[
                    (DateTimeFieldType::DayOfMonth, 30),
                    (DateTimeFieldType::MonthOfYear, 4),
                ],
            )
            .unwrap();
        assert_eq!(chrono.month_of_year().get(resolved), 4);
        assert_eq!(chrono.day_of_month().get(resolved), 30);

        // Absolute bounds are still enforced.
        let err = chrono.day_of_month().set(jan31, 32).unwrap_err();
        assert!(err.is_invalid_field_value());
    }

    #[test]
    fn date_time_millis_is_strict() {
        let chrono = Chronology::iso_utc();
        assert_eq!(
            chrono.date_time_millis(2002, 3, 31, 1, 0, 0, 0).unwrap(),
            LONDON_SPRING,
        );
        assert!(chrono
            .date_time_millis(2023, 2, 29, 0, 0, 0, 0)
            .unwrap_err()
            .is_invalid_field_value());
        assert!(chrono
            .date_time_millis(2023, 1, 1, 24, 0, 0, 0)
            .unwrap_err()
            .is_invalid_field_value());
    }

    #[test]
    fn add_wrapped_stays_in_year() {
        let chrono = Chronology::iso_utc();
        let dec = chrono.date_time_millis(2023, 12, 15, 0, 0, 0, 0).unwrap();
        let wrapped = chrono.month_of_year().add_wrapped(dec, 1).unwrap();
        assert_eq!(chrono.month_of_year().get(wrapped), 1);
        assert_eq!(chrono.year().get(wrapped), 2023);
        let carried = chrono.month_of_year().add(dec, 1).unwrap();
        assert_eq!(chrono.year().get(carried), 2024);
    }

    #[test]
    fn duration_fields() {
        let chrono = Chronology::iso_utc();
        for ty in DurationFieldType::ALL {
            let field = chrono.duration_field(ty).unwrap();
            assert_eq!(field.field_type(), ty);
        }
        let eras = chrono.duration_field(DurationFieldType::Eras).unwrap();
        assert!(!eras.is_supported());
        assert!(eras.add(0, 1).unwrap_err().is_unsupported_field());
        let centuries =
            chrono.duration_field(DurationFieldType::Centuries).unwrap();
        let later = centuries.add(0, 1).unwrap();
        assert_eq!(chrono.year().get(later), 2070);
    }

    #[test]
    fn removed_field_is_unsupported() {
        #[derive(Debug)]
        struct NoWeeks;

        impl CalendarSystem for NoWeeks {
            fn id(&self) -> &'static str {
                "NoWeeks"
            }
            fn is_leap_year(&self, year: i32) -> bool {
                GregorianCalendar.is_leap_year(year)
            }
            fn year_start_day(&self, year: i32) -> i64 {
                GregorianCalendar.year_start_day(year)
            }
            fn days_in_year_month(&self, year: i32, month: i32) -> i32 {
                GregorianCalendar.days_in_year_month(year, month)
            }
            fn max_days_in_month(&self, month: i32) -> i32 {
                GregorianCalendar.max_days_in_month(month)
            }
            fn average_millis_per_year(&self) -> i64 {
                GregorianCalendar.average_millis_per_year()
            }
            fn assemble(&self, fields: &mut Fields) -> Result<(), Error> {
                fields.remove_field(DateTimeFieldType::Weekyear);
                fields.remove_field(DateTimeFieldType::WeekOfWeekyear);
                Ok(())
            }
        }

        let chrono =
            Chronology::new(Arc::new(NoWeeks), TimeZone::UTC).unwrap();
        let err = chrono.field(DateTimeFieldType::Weekyear).unwrap_err();
        assert!(err.is_unsupported_field());
        assert!(chrono.field(DateTimeFieldType::DayOfWeek).is_ok());
        assert_ne!(chrono, Chronology::iso_utc());
    }

    #[test]
    fn fixed_offset_chronology() {
        let zone = TimeZone::fixed(3_600_000).unwrap();
        let chrono = Chronology::iso(zone.clone());
        assert!(chrono.zone().is_fixed());
        assert_eq!(chrono.zone().offset(LONDON_SPRING), 3_600_000);
        assert_eq!(chrono.hour_of_day().get(0), 1);
        assert_eq!(
            chrono.date_time_millis(1970, 1, 1, 1, 0, 0, 0).unwrap(),
            0,
        );
        assert_eq!(chrono, Chronology::iso(zone));
    }

    #[test]
    fn zoned_fields_use_local_time() {
        let chrono = london();
        // 2002-07-01T12:00Z is 13:00 BST.
        let summer = Chronology::iso_utc()
            .date_time_millis(2002, 7, 1, 12, 0, 0, 0)
            .unwrap();
        assert_eq!(chrono.hour_of_day().get(summer), 13);
        let midnight = chrono
            .field(DateTimeFieldType::MillisOfDay)
            .unwrap()
            .set(summer, 0)
            .unwrap();
        assert_eq!(midnight, summer - 13 * MILLIS_PER_HOUR);
    }

    #[test]
    fn zoned_set_in_gap_fails() {
        let chrono = london();
        // Local 00:30 on 2002-03-31, before clocks jump from 01:00 to 02:00.
        let before = LONDON_SPRING - 30 * MILLIS_PER_MINUTE;
        let err = chrono.hour_of_day().set(before, 1).unwrap_err();
        assert!(err.is_invalid_field_value());
        let err =
            chrono.date_time_millis(2002, 3, 31, 1, 30, 0, 0).unwrap_err();
        assert!(err.is_invalid_field_value());
        // Hours are added on the UTC time line, days on the local one.
        let hour_later = chrono.hour_of_day().add(before, 1).unwrap();
        assert_eq!(hour_later, before + MILLIS_PER_HOUR);
        assert_eq!(chrono.hour_of_day().get(hour_later), 2);
        let day_later = chrono.day_of_month().add(before, 1).unwrap();
        assert_eq!(day_later, before + 23 * MILLIS_PER_HOUR);
    }

    #[test]
    fn zoned_fields_near_end_of_time_line() {
        let chrono = Chronology::iso(TimeZone::fixed(3_600_000).unwrap());
        for field in [chrono.hour_of_day(), chrono.day_of_month()] {
            let value = field.get(i64::MAX);
            let err = field.set(i64::MAX, value).unwrap_err();
            assert!(err.is_overflow(), "{err}");

            let instant = i64::MAX - 2 * MILLIS_PER_HOUR;
            let value = field.get(instant);
            assert_eq!(field.set(instant, value).unwrap(), instant);
        }
    }

    #[test]
    fn julian_differs_from_iso() {
        let julian = Chronology::julian(TimeZone::UTC);
        let instant =
            julian.date_time_millis(1582, 10, 5, 0, 0, 0, 0).unwrap();
        let iso = Chronology::iso_utc();
        assert_eq!(iso.day_of_month().get(instant), 15);
        let y1900 = julian.date_time_millis(1900, 1, 1, 0, 0, 0, 0).unwrap();
        assert!(julian.year().is_leap(y1900));
        assert_ne!(julian, iso);
    }

    fn set_get_holds(chrono: &Chronology, instant: i64) -> bool {
        DateTimeFieldType::ALL.iter().all(|&ty| {
            let field = chrono.field(ty).unwrap();
            field.set(instant, field.get(instant)).ok() == Some(instant)
        })
    }

    quickcheck! {
        fn prop_iso_set_get_identity(instant: i64) -> bool {
            set_get_holds(&Chronology::iso_utc(), instant)
        }

        fn prop_julian_set_get_identity(instant: i64) -> bool {
            set_get_holds(&Chronology::julian(TimeZone::UTC), instant)
        }

        fn prop_zoned_set_get_identity(instant: i64) -> TestResult {
            // Stay clear of the ends of the time line, where local time
            // can't be represented.
            if instant.unsigned_abs() > 1 << 60 {
                return TestResult::discard();
            }
            TestResult::from_bool(set_get_holds(&london(), instant))
        }
    }
}
