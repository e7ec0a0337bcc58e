use std::sync::Arc;

use crate::{
    duration::DurationField,
    error::field::Error as FieldError,
    field::{check_value, DateTimeField, DateTimeFieldType},
    util::arith::{self, floor_div, floor_mod},
    Error,
};

/// A field whose unit and range are both precise, such as minute-of-hour or
/// millis-of-day.
///
/// The field's values are `0..n` where `n` is the number of units in one
/// range unit. Because every unit has the same length, all of this field's
/// operations are simple arithmetic on the instant.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use calendrical::{
///     duration::PreciseDurationField,
///     field::{DateTimeField, DateTimeFieldType, PreciseDateTimeField},
/// };
///
/// let minute_of_hour = PreciseDateTimeField::new(
///     DateTimeFieldType::MinuteOfHour,
///     Arc::new(PreciseDurationField::MINUTES),
///     Arc::new(PreciseDurationField::HOURS),
/// ).unwrap();
/// assert_eq!(minute_of_hour.maximum_value(), 59);
/// // One minute before the epoch is minute 59.
/// assert_eq!(minute_of_hour.get(-60_000), 59);
/// ```
#[derive(Clone, Debug)]
pub struct PreciseDateTimeField {
    kind: DateTimeFieldType,
    unit: Arc<dyn DurationField>,
    range: Arc<dyn DurationField>,
    unit_millis: i64,
    len: i32,
}

impl PreciseDateTimeField {
    /// Creates a new precise field.
    ///
    /// Both duration fields must be precise, and the range's unit length
    /// must be a whole multiple (of at least two) of the unit's length.
    pub fn new(
        kind: DateTimeFieldType,
        unit: Arc<dyn DurationField>,
        range: Arc<dyn DurationField>,
    ) -> Result<PreciseDateTimeField, Error> {
        let invalid = || FieldError::InvalidPreciseUnit { field: kind.name() };
        if !unit.is_precise() || !range.is_precise() {
            return Err(invalid().into());
        }
        let (unit_millis, range_millis) =
            (unit.unit_millis(), range.unit_millis());
        if unit_millis < 1 || range_millis % unit_millis != 0 {
            return Err(invalid().into());
        }
        let len = i32::try_from(range_millis / unit_millis)
            .ok()
            .filter(|&len| len >= 2)
            .ok_or_else(invalid)?;
        Ok(PreciseDateTimeField { kind, unit, range, unit_millis, len })
    }
}

impl DateTimeField for PreciseDateTimeField {
    fn field_type(&self) -> DateTimeFieldType {
        self.kind
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.unit
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        Some(&self.range)
    }

    fn get(&self, instant: i64) -> i32 {
        let units = floor_div(instant, self.unit_millis);
        // OK because the residue is in `0..len` and `len` is an i32.
        floor_mod(units, i64::from(self.len)) as i32
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let value = check_value(self, instant, value)?;
        let delta = i64::from(value) - i64::from(self.get(instant));
        let millis = arith::mul(delta, self.unit_millis, self.kind.name())?;
        arith::add(instant, millis, self.kind.name())
    }

    fn minimum_value(&self) -> i32 {
        0
    }

    fn maximum_value(&self) -> i32 {
        self.len - 1
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        let rem = floor_mod(instant, self.unit_millis);
        arith::sub(instant, rem, self.kind.name())
    }

    fn remainder(&self, instant: i64) -> Result<i64, Error> {
        Ok(floor_mod(instant, self.unit_millis))
    }
}
