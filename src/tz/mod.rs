/*!
Time zones: UTC offsets as a function of the instant.

A [`TimeZone`] is either a fixed offset from UTC or a
[`ZoneTable`](table::ZoneTable) of historical transitions. Time zones are
usually obtained from a [`Provider`](provider::Provider), but they can also
be built directly:

```
use calendrical::tz::TimeZone;

let tz = TimeZone::fixed(3_600_000)?;
assert_eq!(tz.id(), "+01:00");
assert!(tz.is_fixed());
assert_eq!(tz.offset(0), 3_600_000);
// Fixed zones have no transitions.
assert_eq!(tz.next_transition(0), 0);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Local instants

A *local instant* is the number of milliseconds since 1970-01-01T00:00:00 on
a wall clock in some time zone. Converting a UTC instant to a local instant
always succeeds (barring overflow), but the reverse doesn't: around a
transition, a local instant can correspond to no UTC instant (a gap) or to
two (an overlap). [`TimeZone::offset_from_local`] picks the earlier of two
candidates in an overlap and shifts forward across a gap.
[`TimeZone::convert_local_to_utc`] can instead reject gaps.
*/

use std::sync::Arc;

use crate::{
    config,
    error::tz::zone::Error as ZoneError,
    Error,
};

pub use self::{
    cache::CacheStats,
    provider::{
        Diagnostic, Provider, TableProvider, TableProviderBuilder,
        UtcProvider,
    },
    store::{DirStore, MemoryStore, ZoneStore},
    table::{Transition, ZoneTable, ZoneTableBuilder},
};

mod cache;
mod provider;
mod store;
mod table;
#[cfg(test)]
pub(crate) mod testdata;

/// A time zone: a function from instants to UTC offsets.
///
/// Time zones are immutable and cheap to clone. Offsets are in
/// milliseconds, positive east of Greenwich.
///
/// Two time zones are equal when they have the same identifier and produce
/// the same offsets. Table-driven zones compare the checksums of their
/// tables.
#[derive(Clone)]
pub struct TimeZone {
    kind: Option<Arc<TimeZoneKind>>,
}

#[derive(Debug)]
enum TimeZoneKind {
    Fixed(TimeZoneFixed),
    Table(ZoneTable),
}

#[derive(Debug)]
struct TimeZoneFixed {
    id: Box<str>,
    offset: i32,
}

impl TimeZone {
    /// The UTC time zone, whose offset is always zero.
    pub const UTC: TimeZone = TimeZone { kind: None };

    /// Returns a time zone with the given fixed offset, in milliseconds.
    ///
    /// The identifier of the zone is derived from the offset, e.g. `+01:00`
    /// or `-04:45:17.045`. A zero offset returns [`TimeZone::UTC`].
    ///
    /// # Errors
    ///
    /// This returns an error if the offset isn't strictly within one day of
    /// UTC.
    pub fn fixed(offset: i32) -> Result<TimeZone, Error> {
        if offset == 0 {
            return Ok(TimeZone::UTC);
        }
        TimeZone::fixed_with_id(&format_offset_id(offset), offset)
    }

    /// Returns a time zone with the given identifier and fixed offset.
    ///
    /// This is what a provider uses for identifiers like `Etc/GMT+5`.
    pub fn fixed_with_id(id: &str, offset: i32) -> Result<TimeZone, Error> {
        check_offset(i64::from(offset))?;
        let fixed = TimeZoneFixed { id: id.into(), offset };
        Ok(TimeZone { kind: Some(Arc::new(TimeZoneKind::Fixed(fixed))) })
    }

    /// Returns a time zone driven by the given table.
    pub fn table(table: ZoneTable) -> TimeZone {
        TimeZone { kind: Some(Arc::new(TimeZoneKind::Table(table))) }
    }

    /// Looks up a time zone by identifier in the global configuration.
    ///
    /// Offset identifiers like `+05:30` are always accepted, even if the
    /// configured provider doesn't know about them.
    ///
    /// # Errors
    ///
    /// This returns an error if the identifier is neither known to the
    /// configured [`Provider`] nor a valid offset identifier.
    pub fn get(id: &str) -> Result<TimeZone, Error> {
        config::global().zone(id)
    }

    /// Returns the default time zone from the global configuration.
    pub fn system() -> TimeZone {
        config::global().default_zone().clone()
    }

    /// The identifier of this time zone, e.g. `Europe/London` or `+01:00`.
    pub fn id(&self) -> &str {
        let Some(ref kind) = self.kind else { return "UTC" };
        match **kind {
            TimeZoneKind::Fixed(ref tz) => &tz.id,
            TimeZoneKind::Table(ref table) => table.id(),
        }
    }

    /// Whether this is [`TimeZone::UTC`].
    pub fn is_utc(&self) -> bool {
        self.kind.is_none()
    }

    /// Whether this time zone's offset never changes.
    pub fn is_fixed(&self) -> bool {
        let Some(ref kind) = self.kind else { return true };
        match **kind {
            TimeZoneKind::Fixed(_) => true,
            TimeZoneKind::Table(ref table) => table.transitions().len() == 1,
        }
    }

    /// Whether both values share the same underlying zone allocation.
    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &TimeZone) -> bool {
        match (self.kind.as_ref(), other.kind.as_ref()) {
            (None, None) => true,
            (Some(k1), Some(k2)) => Arc::ptr_eq(k1, k2),
            _ => false,
        }
    }

    /// Returns the table behind this time zone, if it has one.
    pub fn to_table(&self) -> Option<&ZoneTable> {
        match **self.kind.as_ref()? {
            TimeZoneKind::Fixed(_) => None,
            TimeZoneKind::Table(ref table) => Some(table),
        }
    }

    /// Returns the offset from UTC in effect at the given instant.
    pub fn offset(&self, instant: i64) -> i32 {
        let Some(ref kind) = self.kind else { return 0 };
        match **kind {
            TimeZoneKind::Fixed(ref tz) => tz.offset,
            TimeZoneKind::Table(ref table) => table.offset(instant),
        }
    }

    /// Returns the offset from UTC at the given instant, ignoring daylight
    /// saving time.
    pub fn standard_offset(&self, instant: i64) -> i32 {
        let Some(ref kind) = self.kind else { return 0 };
        match **kind {
            TimeZoneKind::Fixed(ref tz) => tz.offset,
            TimeZoneKind::Table(ref table) => {
                table.lookup(instant).standard_offset()
            }
        }
    }

    /// Whether the offset at the given instant is the standard offset.
    pub fn is_standard_offset(&self, instant: i64) -> bool {
        self.offset(instant) == self.standard_offset(instant)
    }

    /// Returns the key naming the period containing the given instant, e.g.
    /// `GMT` or `BST`. Fixed zones use their identifier.
    pub fn name_key(&self, instant: i64) -> &str {
        let Some(ref kind) = self.kind else { return "UTC" };
        match **kind {
            TimeZoneKind::Fixed(ref tz) => &tz.id,
            TimeZoneKind::Table(ref table) => table.lookup(instant).name_key(),
        }
    }

    /// Returns the first transition strictly after `instant`.
    ///
    /// When there is no later transition (which is always the case for
    /// fixed zones), this returns `instant` itself.
    pub fn next_transition(&self, instant: i64) -> i64 {
        self.to_table()
            .and_then(|table| table.next_transition(instant))
            .map_or(instant, |t| t.instant())
    }

    /// Returns the last transition strictly before `instant`.
    ///
    /// When there is no earlier transition (which is always the case for
    /// fixed zones), this returns `instant` itself.
    pub fn previous_transition(&self, instant: i64) -> i64 {
        self.to_table()
            .and_then(|table| table.previous_transition(instant))
            .map_or(instant, |t| t.instant())
    }

    /// Converts a UTC instant to a local instant in this time zone.
    ///
    /// This returns an overflow error when the local instant is outside the
    /// range of an `i64`, which only happens within one offset of either
    /// end of that range.
    pub fn convert_utc_to_local(&self, instant: i64) -> Result<i64, Error> {
        instant
            .checked_add(i64::from(self.offset(instant)))
            .ok_or_else(|| Error::overflow("local instant"))
    }

    /// Like `convert_utc_to_local`, but saturates at the ends of the time
    /// line instead of failing.
    pub(crate) fn to_local_saturating(&self, instant: i64) -> i64 {
        instant.saturating_add(i64::from(self.offset(instant)))
    }

    /// Returns the offset to subtract from the given local instant to get a
    /// UTC instant.
    ///
    /// In an overlap, this returns the offset of the earlier instant. In a
    /// gap, it returns the offset in effect before the gap, so that the
    /// resulting UTC instant is after the transition. (Local 01:30 in a gap
    /// from 01:00 to 02:00 becomes 02:30.)
    pub fn offset_from_local(&self, local: i64) -> i32 {
        let Some(table) = self.to_table() else { return self.offset(local) };
        let offset_local = table.offset(local);
        let adjusted = local.saturating_sub(i64::from(offset_local));
        let offset_adjusted = table.offset(adjusted);
        if offset_local != offset_adjusted {
            // The offset is increasing. If the two candidates lie on either
            // side of a transition, the local instant is in a gap.
            if offset_local < offset_adjusted {
                let next = |t: i64| {
                    table.next_transition(t).map_or(i64::MAX, |t| t.instant())
                };
                let next_local = next(adjusted);
                let next_adjusted =
                    next(local.saturating_sub(i64::from(offset_adjusted)));
                if next_local != next_adjusted {
                    return offset_local;
                }
            }
        } else {
            // The offset may have just decreased, in which case the local
            // instant could also be read with the previous offset, which
            // gives an earlier instant.
            let i = table
                .transitions()
                .partition_point(|r| r.instant() <= adjusted);
            if i >= 2 {
                let start = table.transitions()[i - 1].instant();
                let offset_prev = table.transitions()[i - 2].offset();
                let diff = i64::from(offset_prev) - i64::from(offset_adjusted);
                if i128::from(adjusted) - i128::from(start)
                    < i128::from(diff)
                {
                    return offset_prev;
                }
            }
        }
        offset_adjusted
    }

    /// Converts a local instant to a UTC instant.
    ///
    /// Ambiguous local instants convert to the earlier UTC instant. When
    /// `strict` is true, a local instant in a gap returns an error for
    /// which [`Error::is_invalid_field_value`] returns `true`. Otherwise,
    /// it is shifted forward by the length of the gap.
    pub fn convert_local_to_utc(
        &self,
        local: i64,
        strict: bool,
    ) -> Result<i64, Error> {
        let offset = self.offset_from_local(local);
        let utc = local
            .checked_sub(i64::from(offset))
            .ok_or_else(|| Error::overflow("instant from local"))?;
        if strict && self.offset(utc) != offset {
            return Err(ZoneError::local_time_in_gap(local, self.id()).into());
        }
        Ok(utc)
    }

    /// Like `convert_local_to_utc`, but when the offset at `original` also
    /// produces a consistent result, uses it. This keeps the offset of an
    /// instant in an overlap when one of its fields is changed.
    pub(crate) fn convert_local_to_utc_near(
        &self,
        local: i64,
        strict: bool,
        original: i64,
    ) -> Result<i64, Error> {
        let offset = self.offset(original);
        if let Some(utc) = local.checked_sub(i64::from(offset)) {
            if self.offset(utc) == offset {
                return Ok(utc);
            }
        }
        self.convert_local_to_utc(local, strict)
    }

    /// Returns the instant in `to` with the same wall clock time as
    /// `instant` has in `from`.
    ///
    /// Wall clock times that fall in a gap in `to` are shifted forward.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::tz::TimeZone;
    ///
    /// let utc = TimeZone::UTC;
    /// let plus2 = TimeZone::fixed(2 * 3_600_000)?;
    /// // 12:00 UTC to 12:00 at +02:00, which is 10:00 UTC.
    /// let noon = 12 * 3_600_000;
    /// assert_eq!(
    ///     TimeZone::convert_local(&utc, &plus2, noon)?,
    ///     10 * 3_600_000,
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn convert_local(
        from: &TimeZone,
        to: &TimeZone,
        instant: i64,
    ) -> Result<i64, Error> {
        if from == to {
            return Ok(instant);
        }
        let local = from.convert_utc_to_local(instant)?;
        to.convert_local_to_utc_near(local, false, instant)
    }
}

impl Default for TimeZone {
    fn default() -> TimeZone {
        TimeZone::UTC
    }
}

impl core::fmt::Debug for TimeZone {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let field: &dyn core::fmt::Debug = match self.kind {
            None => &"UTC",
            Some(ref kind) => match **kind {
                TimeZoneKind::Fixed(ref tz) => tz,
                TimeZoneKind::Table(ref table) => table,
            },
        };
        f.debug_tuple("TimeZone").field(field).finish()
    }
}

impl Eq for TimeZone {}

impl PartialEq for TimeZone {
    fn eq(&self, rhs: &TimeZone) -> bool {
        use self::TimeZoneKind::*;

        match (self.kind.as_ref(), rhs.kind.as_ref()) {
            (None, None) => true,
            (Some(k1), Some(k2)) => {
                if Arc::ptr_eq(k1, k2) {
                    return true;
                }
                match (&**k1, &**k2) {
                    (Fixed(tz1), Fixed(tz2)) => {
                        tz1.id == tz2.id && tz1.offset == tz2.offset
                    }
                    (Table(t1), Table(t2)) => {
                        t1.id() == t2.id() && t1.checksum() == t2.checksum()
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Returns an error if `offset` isn't strictly within one day of UTC.
fn check_offset(offset: i64) -> Result<(), Error> {
    if offset.abs() >= table::MAX_OFFSET_EXCLUSIVE {
        return Err(ZoneError::OffsetOutOfRange { offset }.into());
    }
    Ok(())
}

/// Formats an offset identifier such as `+01:00` or `-04:45:17.045`.
///
/// A zero offset formats as `UTC`. Seconds and milliseconds are only
/// included when they are non-zero.
pub fn format_offset_id(offset: i32) -> String {
    use std::fmt::Write;

    if offset == 0 {
        return "UTC".to_string();
    }
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.unsigned_abs();
    let (hours, rem) = (abs / 3_600_000, abs % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    let (seconds, millis) = (rem / 1_000, rem % 1_000);
    let mut id = format!("{sign}{hours:02}:{minutes:02}");
    if seconds != 0 || millis != 0 {
        // OK because writing to a `String` never fails.
        write!(id, ":{seconds:02}").unwrap();
        if millis != 0 {
            write!(id, ".{millis:03}").unwrap();
        }
    }
    id
}

/// Parses an offset identifier in the format written by
/// [`format_offset_id`] into milliseconds.
///
/// `UTC` (in any case) parses as `0`. Otherwise the identifier must be
/// `[+-]HH:MM`, optionally followed by `:SS` and then `.mmm`.
pub fn parse_offset_id(id: &str) -> Result<i32, Error> {
    let invalid = || Error::from(ZoneError::InvalidOffsetId { id: id.into() });
    if id.eq_ignore_ascii_case("UTC") {
        return Ok(0);
    }
    let bytes = id.as_bytes();
    let sign = match bytes.first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(invalid()),
    };
    let digits = |range: std::ops::Range<usize>, max: i32| -> Option<i32> {
        let part = bytes.get(range)?;
        if !part.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let n = part.iter().fold(0, |n, &b| n * 10 + i32::from(b - b'0'));
        Some(n).filter(|&n| n <= max)
    };
    let field = |at: usize, sep: u8, len: usize, max: i32| -> Option<i32> {
        if *bytes.get(at)? != sep {
            return None;
        }
        digits(at + 1..at + 1 + len, max)
    };

    let hours = digits(1..3, 23).ok_or_else(invalid)?;
    let minutes = field(3, b':', 2, 59).ok_or_else(invalid)?;
    let (mut seconds, mut millis, mut end) = (0, 0, 6);
    if bytes.len() > end {
        seconds = field(end, b':', 2, 59).ok_or_else(invalid)?;
        end += 3;
    }
    if bytes.len() > end {
        millis = field(end, b'.', 3, 999).ok_or_else(invalid)?;
        end += 4;
    }
    if bytes.len() != end {
        return Err(invalid());
    }
    let abs = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
    Ok(sign * abs)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2002-03-31T01:00Z and 2002-10-27T01:00Z.
    const SPRING: i64 = 1_017_536_400_000;
    const AUTUMN: i64 = 1_035_680_400_000;
    const HOUR: i64 = 3_600_000;

    #[test]
    fn fixed() {
        let tz = TimeZone::fixed(3_600_000).unwrap();
        assert!(tz.is_fixed());
        assert!(!tz.is_utc());
        assert_eq!(tz.offset(i64::MIN), 3_600_000);
        assert_eq!(tz.offset(SPRING), 3_600_000);
        assert_eq!(tz.next_transition(SPRING), SPRING);
        assert_eq!(tz.previous_transition(SPRING), SPRING);
        assert_eq!(tz.name_key(0), "+01:00");
        assert!(tz.is_standard_offset(0));
        assert_eq!(TimeZone::fixed(0).unwrap(), TimeZone::UTC);

        let err = TimeZone::fixed(86_400_000).unwrap_err();
        assert!(err.is_invalid_field_value());
    }

    #[test]
    fn london_offsets() {
        let tz = testdata::zone("Europe/London");
        assert!(!tz.is_fixed());
        assert_eq!(tz.offset(SPRING - 1), 0);
        assert_eq!(tz.offset(SPRING), 3_600_000);
        assert_eq!(tz.offset(AUTUMN - 1), 3_600_000);
        assert_eq!(tz.offset(AUTUMN), 0);
        assert_eq!(tz.name_key(SPRING), "BST");
        assert_eq!(tz.name_key(AUTUMN), "GMT");
        assert_eq!(tz.standard_offset(SPRING), 0);
        assert!(!tz.is_standard_offset(SPRING));
        assert_eq!(tz.next_transition(SPRING - 1), SPRING);
        assert_eq!(tz.next_transition(SPRING), AUTUMN);
        assert_eq!(tz.previous_transition(AUTUMN), SPRING);
        assert_eq!(tz.previous_transition(AUTUMN + 1), AUTUMN);
    }

    #[test]
    fn local_gap() {
        let tz = testdata::zone("Europe/London");
        // Local 01:30 on 2002-03-31 doesn't exist.
        let local = SPRING + HOUR / 2;
        assert_eq!(tz.offset_from_local(local), 0);
        let err = tz.convert_local_to_utc(local, true).unwrap_err();
        assert!(err.is_invalid_field_value());
        // Leniently, it becomes 02:30 BST.
        assert_eq!(tz.convert_local_to_utc(local, false).unwrap(), local);
        assert_eq!(tz.convert_utc_to_local(local).unwrap(), local + HOUR);

        let ny = testdata::zone("America/New_York");
        // 2007-03-11 02:30 local doesn't exist in New York. It becomes 03:30
        // EDT, which is 07:30Z.
        let local = 1_173_580_200_000;
        let utc = ny.convert_local_to_utc(local, false).unwrap();
        assert_eq!(utc, local + 5 * HOUR);
        assert!(ny.convert_local_to_utc(local, true).is_err());
    }

    #[test]
    fn local_overlap_prefers_earlier() {
        let tz = testdata::zone("Europe/London");
        // Local 01:30 on 2002-10-27 happens twice: 00:30Z and 01:30Z.
        let local = AUTUMN + HOUR / 2;
        assert_eq!(tz.offset_from_local(local), 3_600_000);
        assert_eq!(
            tz.convert_local_to_utc(local, true).unwrap(),
            local - HOUR,
        );
        // When a hint is given, the hinted offset wins.
        let later = local;
        assert_eq!(
            tz.convert_local_to_utc_near(local, true, later).unwrap(),
            later,
        );

        let ny = testdata::zone("America/New_York");
        // 2007-11-04 01:30 local happens at 05:30Z and 06:30Z.
        let local = 1_194_139_800_000;
        assert_eq!(
            ny.convert_local_to_utc(local, true).unwrap(),
            local + 4 * HOUR,
        );
    }

    #[test]
    fn keep_local() {
        let london = testdata::zone("Europe/London");
        let paris = testdata::zone("Europe/Paris");
        let summer = SPRING + 30 * 24 * HOUR;
        let moved = TimeZone::convert_local(&london, &paris, summer).unwrap();
        assert_eq!(moved, summer - HOUR);
        assert_eq!(
            TimeZone::convert_local(&paris, &paris, summer).unwrap(),
            summer,
        );
    }

    #[test]
    fn equality() {
        let a = testdata::zone("Europe/London");
        let b = testdata::zone("Europe/London");
        assert_eq!(a, b);
        assert_ne!(a, testdata::zone("Europe/Paris"));
        assert_ne!(a, TimeZone::UTC);
        assert_ne!(
            TimeZone::fixed_with_id("GMT", 0).unwrap(),
            TimeZone::UTC,
        );
    }

    #[test]
    fn offset_ids() {
        assert_eq!(format_offset_id(0), "UTC");
        assert_eq!(format_offset_id(3_600_000), "+01:00");
        assert_eq!(format_offset_id(-19_800_000), "-05:30");
        assert_eq!(format_offset_id(17_117_045), "+04:45:17.045");
        assert_eq!(format_offset_id(17_117_000), "+04:45:17");

        for offset in [0, 3_600_000, -19_800_000, 17_117_045, -86_399_999] {
            let id = format_offset_id(offset);
            assert_eq!(parse_offset_id(&id).unwrap(), offset, "{id}");
        }
        for bad in [
            "", "+1", "+01", "01:00", "+24:00", "+01:60", "+01:00:",
            "+01:00:00.1",
        ] {
            assert!(parse_offset_id(bad).is_err(), "{bad:?}");
        }
    }
}
