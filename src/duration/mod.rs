/*!
Duration fields: units of elapsed time.

A [`DurationField`] measures time in one unit, such as milliseconds, days or
months. Some units are *precise*: every unit has the same length in
milliseconds. Others, like months and years, are *imprecise* because their
length depends on where in the calendar they are measured. Imprecise
duration fields are provided by a [`CalendarSystem`](crate::chrono::CalendarSystem)
through a [`Chronology`](crate::chrono::Chronology). The precise ones live
here.

Every operation that produces an instant is checked. Overflowing the range
of an `i64` millisecond count is reported as an error for which
[`Error::is_overflow`](crate::Error::is_overflow) returns `true`.
*/

use std::sync::Arc;

use crate::{
    error::field::Error as FieldError,
    util::arith::{self, floor_div},
    Error,
};

/// The kind of a duration field, ordered from the shortest unit to the
/// longest.
///
/// The ordering is what [`Chronology::resolve`](crate::chrono::Chronology::resolve)
/// uses to apply field values from the largest unit to the smallest.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum DurationFieldType {
    Millis,
    Seconds,
    Minutes,
    Hours,
    HalfDays,
    Days,
    Weeks,
    Months,
    WeekYears,
    Years,
    Centuries,
    Eras,
}

impl DurationFieldType {
    /// Every duration field type, in ascending order of unit length.
    pub const ALL: [DurationFieldType; 12] = [
        DurationFieldType::Millis,
        DurationFieldType::Seconds,
        DurationFieldType::Minutes,
        DurationFieldType::Hours,
        DurationFieldType::HalfDays,
        DurationFieldType::Days,
        DurationFieldType::Weeks,
        DurationFieldType::Months,
        DurationFieldType::WeekYears,
        DurationFieldType::Years,
        DurationFieldType::Centuries,
        DurationFieldType::Eras,
    ];

    /// Returns the conventional name of this duration type, e.g. `months`.
    pub fn name(self) -> &'static str {
        use self::DurationFieldType::*;

        match self {
            Millis => "millis",
            Seconds => "seconds",
            Minutes => "minutes",
            Hours => "hours",
            HalfDays => "halfdays",
            Days => "days",
            Weeks => "weeks",
            Months => "months",
            WeekYears => "weekyears",
            Years => "years",
            Centuries => "centuries",
            Eras => "eras",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DurationFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of time that can be added to an instant and measured between two
/// instants.
///
/// Implementations are immutable and shared between the date-time fields
/// that use them, so they must be `Send + Sync`.
pub trait DurationField: std::fmt::Debug + Send + Sync {
    /// The kind of unit this field measures.
    fn field_type(&self) -> DurationFieldType;

    /// Whether this duration field supports any arithmetic at all. Only
    /// [`UnsupportedDurationField`] returns `false`.
    fn is_supported(&self) -> bool {
        true
    }

    /// Whether every unit of this field has the same length.
    fn is_precise(&self) -> bool;

    /// The length of one unit in milliseconds.
    ///
    /// For precise fields this is exact. For imprecise fields it is the
    /// average length of a unit, which is useful for ordering units but
    /// must not be used for arithmetic.
    fn unit_millis(&self) -> i64;

    /// The length of the unit starting at `instant`, in milliseconds.
    ///
    /// For precise fields this always equals [`DurationField::unit_millis`].
    /// For imprecise fields it is measured by adding one unit to `instant`.
    fn unit_millis_at(&self, instant: i64) -> Result<i64, Error> {
        if self.is_precise() {
            return Ok(self.unit_millis());
        }
        let next = self.add(instant, 1)?;
        arith::sub(next, instant, "unit length")
    }

    /// Adds `amount` units to `instant`. Negative amounts subtract.
    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error>;

    /// Returns the number of whole units from `subtrahend` to `minuend`.
    ///
    /// The count is floored: it is the largest `n` such that adding `n`
    /// units to `subtrahend` does not pass `minuend`. For a negative span
    /// that isn't a whole number of units, this means the count is one
    /// further from zero than truncation would give.
    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error>;

    /// Returns the number of milliseconds spanned by `value` units starting
    /// at `instant`.
    fn value_millis(&self, value: i64, instant: i64) -> Result<i64, Error> {
        if self.is_precise() {
            return arith::mul(value, self.unit_millis(), "duration millis");
        }
        let end = self.add(instant, value)?;
        arith::sub(end, instant, "duration millis")
    }
}

/// A duration field whose every unit is a fixed number of milliseconds.
///
/// # Example
///
/// ```
/// use calendrical::duration::{DurationField, PreciseDurationField};
///
/// let hours = PreciseDurationField::HOURS;
/// assert_eq!(hours.add(0, 2).unwrap(), 7_200_000);
/// assert_eq!(hours.difference(7_200_000, 0).unwrap(), 2);
/// // Floored, not truncated.
/// assert_eq!(hours.difference(-1, 0).unwrap(), -1);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PreciseDurationField {
    kind: DurationFieldType,
    unit: i64,
}

impl PreciseDurationField {
    pub const MILLIS: PreciseDurationField =
        PreciseDurationField { kind: DurationFieldType::Millis, unit: 1 };
    pub const SECONDS: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::Seconds,
        unit: arith::MILLIS_PER_SECOND,
    };
    pub const MINUTES: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::Minutes,
        unit: arith::MILLIS_PER_MINUTE,
    };
    pub const HOURS: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::Hours,
        unit: arith::MILLIS_PER_HOUR,
    };
    pub const HALFDAYS: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::HalfDays,
        unit: arith::MILLIS_PER_HALFDAY,
    };
    pub const DAYS: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::Days,
        unit: arith::MILLIS_PER_DAY,
    };
    pub const WEEKS: PreciseDurationField = PreciseDurationField {
        kind: DurationFieldType::Weeks,
        unit: arith::MILLIS_PER_WEEK,
    };

    /// Creates a precise duration field with the given unit length.
    ///
    /// This returns an error when `unit_millis` is not positive.
    pub fn new(
        kind: DurationFieldType,
        unit_millis: i64,
    ) -> Result<PreciseDurationField, Error> {
        if unit_millis < 1 {
            return Err(Error::from(FieldError::out_of_range(
                "unit millis",
                unit_millis,
                1,
                i64::MAX,
            )));
        }
        Ok(PreciseDurationField { kind, unit: unit_millis })
    }
}

impl DurationField for PreciseDurationField {
    fn field_type(&self) -> DurationFieldType {
        self.kind
    }

    fn is_precise(&self) -> bool {
        true
    }

    fn unit_millis(&self) -> i64 {
        self.unit
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let millis = arith::mul(amount, self.unit, self.kind.name())?;
        arith::add(instant, millis, self.kind.name())
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        // The span between two arbitrary instants doesn't fit in an i64,
        // but the number of units always does unless the unit is one
        // millisecond.
        let span = i128::from(minuend) - i128::from(subtrahend);
        let units = span.div_euclid(i128::from(self.unit));
        i64::try_from(units).map_err(|_| Error::overflow(self.kind.name()))
    }
}

/// A duration field that is a whole multiple of another duration field.
///
/// This is how centuries are derived from years: adding one century adds one
/// hundred years through the wrapped field, so it inherits the wrapped
/// field's calendar rules (and its imprecision).
#[derive(Clone, Debug)]
pub struct ScaledDurationField {
    kind: DurationFieldType,
    wrapped: Arc<dyn DurationField>,
    scalar: i64,
}

impl ScaledDurationField {
    /// Creates a new scaled duration field. The scalar must be at least 2.
    pub fn new(
        kind: DurationFieldType,
        wrapped: Arc<dyn DurationField>,
        scalar: i32,
    ) -> Result<ScaledDurationField, Error> {
        if scalar < 2 {
            return Err(Error::from(FieldError::InvalidDivisor {
                divisor: scalar,
            }));
        }
        Ok(ScaledDurationField { kind, wrapped, scalar: i64::from(scalar) })
    }

    /// The duration field being scaled.
    pub fn wrapped(&self) -> &Arc<dyn DurationField> {
        &self.wrapped
    }
}

impl DurationField for ScaledDurationField {
    fn field_type(&self) -> DurationFieldType {
        self.kind
    }

    fn is_supported(&self) -> bool {
        self.wrapped.is_supported()
    }

    fn is_precise(&self) -> bool {
        self.wrapped.is_precise()
    }

    fn unit_millis(&self) -> i64 {
        self.wrapped.unit_millis().saturating_mul(self.scalar)
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let scaled = arith::mul(amount, self.scalar, self.kind.name())?;
        self.wrapped.add(instant, scaled)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        let inner = self.wrapped.difference(minuend, subtrahend)?;
        Ok(floor_div(inner, self.scalar))
    }
}

/// A duration field for a unit that a chronology doesn't support.
///
/// Every arithmetic operation fails with an error for which
/// [`Error::is_unsupported_field`](crate::Error::is_unsupported_field)
/// returns `true`.
#[derive(Clone, Copy, Debug)]
pub struct UnsupportedDurationField {
    kind: DurationFieldType,
}

impl UnsupportedDurationField {
    pub fn new(kind: DurationFieldType) -> UnsupportedDurationField {
        UnsupportedDurationField { kind }
    }

    fn unsupported(&self) -> Error {
        Error::from(FieldError::Unsupported { field: self.kind.name() })
    }
}

impl DurationField for UnsupportedDurationField {
    fn field_type(&self) -> DurationFieldType {
        self.kind
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn is_precise(&self) -> bool {
        true
    }

    fn unit_millis(&self) -> i64 {
        0
    }

    fn add(&self, _instant: i64, _amount: i64) -> Result<i64, Error> {
        Err(self.unsupported())
    }

    fn difference(
        &self,
        _minuend: i64,
        _subtrahend: i64,
    ) -> Result<i64, Error> {
        Err(self.unsupported())
    }
}
