use std::sync::Arc;

use crate::{
    duration::{DurationField, DurationFieldType, ScaledDurationField},
    field::{check_value, DateTimeField, DateTimeFieldType},
    util::arith::{self, floor_div, floor_mod},
    Error,
};

/// A field derived from another field by floor division.
///
/// Given a wrapped field `W` and a divisor `d`, this field's value at any
/// instant is `floor(W.get(instant) / d)`. Floor division means negative
/// values of `W` divide toward negative infinity: a year of `-50` is in
/// century `-1`.
///
/// Setting this field rewrites the quotient while preserving the residue,
/// which is what [`RemainderDateTimeField`] reads. For every instant `m`:
///
/// ```text
/// divided.get(m) * d + remainder.get(m) == W.get(m)
/// ```
///
/// # Example
///
/// ```
/// use calendrical::{
///     chrono::Chronology,
///     duration::DurationFieldType,
///     field::{DateTimeField, DateTimeFieldType, DividedDateTimeField},
/// };
///
/// let chrono = Chronology::iso_utc();
/// let century = DividedDateTimeField::new(
///     DateTimeFieldType::CenturyOfEra,
///     chrono.year().clone(),
///     DurationFieldType::Centuries,
///     100,
/// ).unwrap();
/// let instant = chrono.year().set(0, -50).unwrap();
/// assert_eq!(century.get(instant), -1);
/// ```
#[derive(Clone, Debug)]
pub struct DividedDateTimeField {
    kind: DateTimeFieldType,
    wrapped: Arc<dyn DateTimeField>,
    duration: Arc<dyn DurationField>,
    divisor: i32,
    min: i32,
    max: i32,
}

impl DividedDateTimeField {
    /// Creates a new divided field over `wrapped`.
    ///
    /// The new field counts units of `duration_kind`, each of which is
    /// `divisor` units of the wrapped field. The divisor must be at least
    /// `2`.
    pub fn new(
        kind: DateTimeFieldType,
        wrapped: Arc<dyn DateTimeField>,
        duration_kind: DurationFieldType,
        divisor: i32,
    ) -> Result<DividedDateTimeField, Error> {
        let duration = Arc::new(ScaledDurationField::new(
            duration_kind,
            Arc::clone(wrapped.duration_field()),
            divisor,
        )?);
        let d = i64::from(divisor);
        // OK because dividing an i32 by at least 2 always fits in an i32.
        let min = floor_div(i64::from(wrapped.minimum_value()), d) as i32;
        let max = floor_div(i64::from(wrapped.maximum_value()), d) as i32;
        Ok(DividedDateTimeField { kind, wrapped, duration, divisor, min, max })
    }

    /// The field being divided.
    pub fn wrapped(&self) -> &Arc<dyn DateTimeField> {
        &self.wrapped
    }

    /// The divisor applied to the wrapped field's value.
    pub fn divisor(&self) -> i32 {
        self.divisor
    }

    fn residue(&self, instant: i64) -> i64 {
        floor_mod(
            i64::from(self.wrapped.get(instant)),
            i64::from(self.divisor),
        )
    }

    /// Returns `instant` moved to the smallest and the largest value of the
    /// wrapped field that share its quotient.
    ///
    /// Both are clamped to the values the wrapped field can take at
    /// `instant`, since year-of-era has no year zero. The smallest value
    /// isn't necessarily the earliest: year-of-era counts backwards before
    /// the common era.
    fn quotient_ends(&self, instant: i64) -> Result<[i64; 2], Error> {
        let d = i64::from(self.divisor);
        let first = i64::from(self.get(instant)) * d;
        let (min, max) = (
            i64::from(self.wrapped.minimum_value_at(instant)),
            i64::from(self.wrapped.maximum_value_at(instant)),
        );
        let mut ends = [first, first + d - 1];
        for end in ends.iter_mut() {
            let value = (*end).clamp(min, max);
            let value = arith::to_i32(value, self.kind.name())?;
            *end = self.wrapped.set(instant, value)?;
        }
        Ok(ends)
    }
}

impl DateTimeField for DividedDateTimeField {
    fn field_type(&self) -> DateTimeFieldType {
        self.kind
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.duration
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        self.wrapped.range_duration_field()
    }

    fn get(&self, instant: i64) -> i32 {
        let value = i64::from(self.wrapped.get(instant));
        // OK for the same reason as the bounds computed in `new`.
        floor_div(value, i64::from(self.divisor)) as i32
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let value = check_value(self, instant, value)?;
        let target = i64::from(value) * i64::from(self.divisor)
            + self.residue(instant);
        let target = arith::to_i32(target, self.kind.name())?;
        self.wrapped.set(instant, target)
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let scaled =
            arith::mul(amount, i64::from(self.divisor), self.kind.name())?;
        self.wrapped.add(instant, scaled)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        let inner = self.wrapped.difference(minuend, subtrahend)?;
        Ok(floor_div(inner, i64::from(self.divisor)))
    }

    fn minimum_value(&self) -> i32 {
        self.min
    }

    fn maximum_value(&self) -> i32 {
        self.max
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let [low, high] = self.quotient_ends(instant)?;
        let low = self.wrapped.round_floor(low)?;
        let high = self.wrapped.round_floor(high)?;
        Ok(low.min(high))
    }

    fn round_ceiling(&self, instant: i64) -> Result<i64, Error> {
        if self.round_floor(instant)? == instant {
            return Ok(instant);
        }
        let [low, high] = self.quotient_ends(instant)?;
        let low = self.wrapped.add(self.wrapped.round_floor(low)?, 1)?;
        let high = self.wrapped.add(self.wrapped.round_floor(high)?, 1)?;
        Ok(low.max(high))
    }
}

/// A field derived from another field as the non-negative residue of floor
/// division.
///
/// This is the dual of [`DividedDateTimeField`]: with a wrapped field `W`
/// and divisor `d`, this field's value is in `0..d`, and setting it
/// preserves the quotient.
///
/// # Example
///
/// ```
/// use calendrical::{
///     chrono::Chronology,
///     field::{DateTimeField, DateTimeFieldType},
/// };
///
/// let chrono = Chronology::iso_utc();
/// let hour_of_halfday = chrono.field(DateTimeFieldType::HourOfHalfday)?;
/// let halfday_of_day = chrono.field(DateTimeFieldType::HalfdayOfDay)?;
/// // 1969-12-31T23:00Z
/// let instant = -3_600_000;
/// assert_eq!(hour_of_halfday.get(instant), 11);
/// assert_eq!(halfday_of_day.get(instant), 1);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct RemainderDateTimeField {
    kind: DateTimeFieldType,
    wrapped: Arc<dyn DateTimeField>,
    range: Arc<dyn DurationField>,
    divisor: i32,
}

impl RemainderDateTimeField {
    /// Creates a new remainder field over `wrapped`.
    ///
    /// This field rolls into units of `range_kind`, each of which is
    /// `divisor` units of the wrapped field. The divisor must be at least
    /// `2`.
    pub fn new(
        kind: DateTimeFieldType,
        wrapped: Arc<dyn DateTimeField>,
        range_kind: DurationFieldType,
        divisor: i32,
    ) -> Result<RemainderDateTimeField, Error> {
        let range = Arc::new(ScaledDurationField::new(
            range_kind,
            Arc::clone(wrapped.duration_field()),
            divisor,
        )?);
        Ok(RemainderDateTimeField { kind, wrapped, range, divisor })
    }

    /// Creates the remainder field paired with the given divided field.
    ///
    /// The result shares the divided field's wrapped field and divisor, and
    /// rolls into the divided field's unit.
    pub fn from_divided(
        kind: DateTimeFieldType,
        divided: &DividedDateTimeField,
    ) -> RemainderDateTimeField {
        RemainderDateTimeField {
            kind,
            wrapped: Arc::clone(&divided.wrapped),
            range: Arc::clone(&divided.duration),
            divisor: divided.divisor,
        }
    }

    /// The field being divided.
    pub fn wrapped(&self) -> &Arc<dyn DateTimeField> {
        &self.wrapped
    }

    /// The divisor applied to the wrapped field's value.
    pub fn divisor(&self) -> i32 {
        self.divisor
    }
}

impl DateTimeField for RemainderDateTimeField {
    fn field_type(&self) -> DateTimeFieldType {
        self.kind
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        self.wrapped.duration_field()
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.range)
    }

    fn get(&self, instant: i64) -> i32 {
        let value = i64::from(self.wrapped.get(instant));
        // OK because the residue is in `0..divisor`.
        floor_mod(value, i64::from(self.divisor)) as i32
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let value = check_value(self, instant, value)?;
        let d = i64::from(self.divisor);
        let quotient = floor_div(i64::from(self.wrapped.get(instant)), d);
        let target =
            arith::to_i32(quotient * d + i64::from(value), self.kind.name())?;
        self.wrapped.set(instant, target)
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        self.wrapped.add(instant, amount)
    }

    fn add_wrapped(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let value =
            arith::wrap_add(self.get(instant), amount, 0, self.divisor - 1);
        self.set(instant, value)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        self.wrapped.difference(minuend, subtrahend)
    }

    fn minimum_value(&self) -> i32 {
        0
    }

    fn maximum_value(&self) -> i32 {
        self.divisor - 1
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        self.wrapped.round_floor(instant)
    }

    fn remainder(&self, instant: i64) -> Result<i64, Error> {
        self.wrapped.remainder(instant)
    }
}
