use std::sync::Arc;

use crate::{
    duration::{DurationField, DurationFieldType},
    error::field::Error as FieldError,
    field::{DateTimeField, DateTimeFieldType},
    tz::TimeZone,
    util::arith::{self, MILLIS_PER_HALFDAY},
    Error,
};

/// Whether arithmetic in units of `field` can ignore offset changes.
///
/// Units shorter than half a day are added on the UTC time line, so adding
/// one hour across a transition always advances the instant by one hour.
/// Longer units are added on the local time line, so adding one day across
/// a transition preserves the wall clock.
fn uses_time_arithmetic(field: &dyn DurationField) -> bool {
    field.unit_millis() < MILLIS_PER_HALFDAY
}

/// A duration field adjusted for a time zone.
///
/// The wrapped field operates on local instants. This converts to and from
/// UTC around each operation.
#[derive(Clone, Debug)]
pub struct ZonedDurationField {
    field: Arc<dyn DurationField>,
    zone: TimeZone,
    time_field: bool,
}

impl ZonedDurationField {
    /// Wraps `field` so that it operates in `zone`.
    pub fn new(
        field: Arc<dyn DurationField>,
        zone: TimeZone,
    ) -> ZonedDurationField {
        let time_field = uses_time_arithmetic(&*field);
        ZonedDurationField { field, zone, time_field }
    }

    fn offset_to_add(&self, instant: i64) -> Result<i64, Error> {
        let offset = i64::from(self.zone.offset(instant));
        arith::add(instant, offset, "local instant")?;
        Ok(offset)
    }

    fn offset_from_local_to_subtract(&self, local: i64) -> Result<i64, Error> {
        let offset = i64::from(self.zone.offset_from_local(local));
        arith::sub(local, offset, "instant from local")?;
        Ok(offset)
    }
}

impl DurationField for ZonedDurationField {
    fn field_type(&self) -> DurationFieldType {
        self.field.field_type()
    }

    fn is_supported(&self) -> bool {
        self.field.is_supported()
    }

    fn is_precise(&self) -> bool {
        if self.time_field {
            self.field.is_precise()
        } else {
            self.field.is_precise() && self.zone.is_fixed()
        }
    }

    fn unit_millis(&self) -> i64 {
        self.field.unit_millis()
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let offset = self.offset_to_add(instant)?;
        let local = self.field.add(instant + offset, amount)?;
        let offset = if self.time_field {
            offset
        } else {
            self.offset_from_local_to_subtract(local)?
        };
        arith::sub(local, offset, "instant from local")
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        let offset = self.offset_to_add(subtrahend)?;
        let minuend_offset = if self.time_field {
            offset
        } else {
            self.offset_to_add(minuend)?
        };
        let minuend = arith::add(minuend, minuend_offset, "local instant")?;
        self.field.difference(minuend, subtrahend + offset)
    }
}

/// A date-time field adjusted for a time zone.
///
/// The wrapped field reads and writes local instants. Setting a field
/// converts the result back to UTC, preferring the offset in effect at the
/// original instant when the local time is ambiguous. If the requested value
/// can't be represented because the local time falls in a gap (for example,
/// 01:30 on the day clocks spring forward from 01:00 to 02:00), `set` fails
/// with an error for which
/// [`Error::is_invalid_field_value`](crate::Error::is_invalid_field_value)
/// returns `true`.
#[derive(Clone, Debug)]
pub struct ZonedDateTimeField {
    field: Arc<dyn DateTimeField>,
    zone: TimeZone,
    duration: Arc<dyn DurationField>,
    range: Option<Arc<dyn DurationField>>,
    time_field: bool,
}

impl ZonedDateTimeField {
    /// Wraps `field` so that it operates in `zone`.
    ///
    /// The duration fields given should be the zoned versions of the
    /// wrapped field's duration and range fields, so that they can be
    /// shared with the rest of a chronology.
    pub fn new(
        field: Arc<dyn DateTimeField>,
        zone: TimeZone,
        duration: Arc<dyn DurationField>,
        range: Option<Arc<dyn DurationField>>,
    ) -> ZonedDateTimeField {
        let time_field = uses_time_arithmetic(&**field.duration_field());
        ZonedDateTimeField { field, zone, duration, range, time_field }
    }

    fn offset_to_add(&self, instant: i64) -> Result<i64, Error> {
        let offset = i64::from(self.zone.offset(instant));
        arith::add(instant, offset, "local instant")?;
        Ok(offset)
    }

    fn local(&self, instant: i64) -> i64 {
        self.zone.to_local_saturating(instant)
    }

    fn to_utc(&self, local: i64, original: i64) -> Result<i64, Error> {
        self.zone.convert_local_to_utc_near(local, false, original)
    }
}

impl DateTimeField for ZonedDateTimeField {
    fn field_type(&self) -> DateTimeFieldType {
        self.field.field_type()
    }

    fn duration_field(&self) -> &Arc<dyn DurationField> {
        &self.duration
    }

    fn range_duration_field(&self) -> Option<&Arc<dyn DurationField>> {
        self.range.as_ref()
    }

    fn get(&self, instant: i64) -> i32 {
        self.field.get(self.local(instant))
    }

    fn set(&self, instant: i64, value: i32) -> Result<i64, Error> {
        let local = self.zone.convert_utc_to_local(instant)?;
        let local = self.field.set(local, value)?;
        let result = self.to_utc(local, instant)?;
        // The wrapped field may have clamped the value, so compare against
        // what it actually set rather than what was requested.
        if self.get(result) != self.field.get(local) {
            let ty = self.field.field_type();
            return Err(
                FieldError::in_gap(ty.name(), value, self.zone.id()).into()
            );
        }
        Ok(result)
    }

    fn add(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        if self.time_field {
            let offset = self.offset_to_add(instant)?;
            let local = self.field.add(instant + offset, amount)?;
            return arith::sub(local, offset, "instant from local");
        }
        let local = self.zone.convert_utc_to_local(instant)?;
        let local = self.field.add(local, amount)?;
        self.to_utc(local, instant)
    }

    fn add_wrapped(&self, instant: i64, amount: i64) -> Result<i64, Error> {
        let local = self.zone.convert_utc_to_local(instant)?;
        let local = self.field.add_wrapped(local, amount)?;
        self.to_utc(local, instant)
    }

    fn difference(&self, minuend: i64, subtrahend: i64) -> Result<i64, Error> {
        let offset = self.offset_to_add(subtrahend)?;
        let minuend_offset = if self.time_field {
            offset
        } else {
            self.offset_to_add(minuend)?
        };
        self.field.difference(minuend + minuend_offset, subtrahend + offset)
    }

    fn minimum_value(&self) -> i32 {
        self.field.minimum_value()
    }

    fn maximum_value(&self) -> i32 {
        self.field.maximum_value()
    }

    fn minimum_value_at(&self, instant: i64) -> i32 {
        self.field.minimum_value_at(self.local(instant))
    }

    fn maximum_value_at(&self, instant: i64) -> i32 {
        self.field.maximum_value_at(self.local(instant))
    }

    fn is_leap(&self, instant: i64) -> bool {
        self.field.is_leap(self.local(instant))
    }

    fn round_floor(&self, instant: i64) -> Result<i64, Error> {
        if self.time_field {
            let offset = self.offset_to_add(instant)?;
            let local = self.field.round_floor(instant + offset)?;
            return arith::sub(local, offset, "instant from local");
        }
        let local = self.zone.convert_utc_to_local(instant)?;
        let local = self.field.round_floor(local)?;
        self.to_utc(local, instant)
    }

    fn round_ceiling(&self, instant: i64) -> Result<i64, Error> {
        if self.time_field {
            let offset = self.offset_to_add(instant)?;
            let local = self.field.round_ceiling(instant + offset)?;
            return arith::sub(local, offset, "instant from local");
        }
        let local = self.zone.convert_utc_to_local(instant)?;
        let local = self.field.round_ceiling(local)?;
        self.to_utc(local, instant)
    }

    fn remainder(&self, instant: i64) -> Result<i64, Error> {
        let local = self.zone.convert_utc_to_local(instant)?;
        self.field.remainder(local)
    }
}
