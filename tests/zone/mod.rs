use calendrical::{chrono::Chronology, field::DateTimeField, tz::TimeZone};

use crate::{zone, Result};

// 2002-03-31T01:00:00Z and 2002-10-27T01:00:00Z, when the EU moved to and
// from summer time.
const LONDON_2002_SPRING: i64 = 1_017_536_400_000;
const LONDON_2002_AUTUMN: i64 = 1_035_680_400_000;
// 2002-01-15T12:00:00Z
const WINTER: i64 = 1_011_096_000_000;
// 2002-07-01T12:00:00Z
const SUMMER: i64 = 1_025_524_800_000;

/// A chronology bound to a fixed `+01:00` zone always has that offset, and
/// its zone never transitions.
#[test]
fn fixed_offset_chronology() -> Result {
    let chrono = Chronology::iso(TimeZone::fixed(3_600_000)?);
    let tz = chrono.zone();
    assert!(tz.is_fixed());
    assert_eq!(tz.id(), "+01:00");
    for instant in [i64::MIN, -1, 0, WINTER, SUMMER, i64::MAX] {
        assert_eq!(tz.offset(instant), 3_600_000);
        assert_eq!(tz.standard_offset(instant), 3_600_000);
        assert_eq!(tz.next_transition(instant), instant);
        assert_eq!(tz.previous_transition(instant), instant);
    }
    assert_eq!(chrono.hour_of_day().get(0), 1);
    assert_eq!(chrono.date_time_millis(1970, 1, 1, 1, 0, 0, 0)?, 0);
    Ok(())
}

/// Europe/London is on GMT in winter and BST in summer, switching at the
/// documented 2002 instants.
#[test]
fn london_2002() {
    let london = zone("Europe/London");
    assert_eq!(london.offset(WINTER), 0);
    assert_eq!(london.offset(SUMMER), 3_600_000);
    assert_eq!(london.name_key(WINTER), "GMT");
    assert_eq!(london.name_key(SUMMER), "BST");
    assert!(london.is_standard_offset(WINTER));
    assert!(!london.is_standard_offset(SUMMER));
    assert_eq!(london.standard_offset(SUMMER), 0);
    assert!(!london.is_fixed());

    assert_eq!(london.offset(LONDON_2002_SPRING - 1), 0);
    assert_eq!(london.offset(LONDON_2002_SPRING), 3_600_000);
    assert_eq!(london.offset(LONDON_2002_AUTUMN - 1), 3_600_000);
    assert_eq!(london.offset(LONDON_2002_AUTUMN), 0);

    assert_eq!(london.next_transition(WINTER), LONDON_2002_SPRING);
    assert_eq!(london.next_transition(LONDON_2002_SPRING), LONDON_2002_AUTUMN);
    assert_eq!(london.previous_transition(SUMMER), LONDON_2002_SPRING);
    assert_eq!(
        london.previous_transition(LONDON_2002_AUTUMN),
        LONDON_2002_SPRING,
    );
}

/// The offset is constant between consecutive transitions.
#[test]
fn offset_constant_between_transitions() {
    let tz = zone("America/New_York");
    let mut start = tz.next_transition(0);
    for _ in 0..40 {
        let end = tz.next_transition(start);
        assert!(end > start);
        let offset = tz.offset(start);
        let step = ((end - start) / 17).max(1);
        let mut instant = start;
        while instant < end {
            assert_eq!(tz.offset(instant), offset, "at {instant}");
            instant += step;
        }
        assert_eq!(tz.offset(end - 1), offset);
        start = end;
    }
}

#[test]
fn new_york_gap_and_overlap() -> Result {
    let ny = zone("America/New_York");
    let chrono = Chronology::iso(ny.clone());

    // 2007-03-11T02:30 doesn't exist in New York.
    let err = chrono.date_time_millis(2007, 3, 11, 2, 30, 0, 0).unwrap_err();
    assert!(err.is_invalid_field_value(), "{err}");
    let local = 1_173_580_200_000;
    assert!(ny.convert_local_to_utc(local, true).is_err());
    // Leniently, the local time is shifted forward by the gap.
    assert_eq!(
        ny.convert_local_to_utc(local, false)?,
        local + 5 * 3_600_000,
    );

    // 2007-11-04T01:30 happens twice. The earlier one is picked.
    let local = 1_194_139_800_000;
    let utc = chrono.date_time_millis(2007, 11, 4, 1, 30, 0, 0)?;
    assert_eq!(utc, local + 4 * 3_600_000);
    assert_eq!(ny.offset_from_local(local), -4 * 3_600_000);
    assert_eq!(ny.convert_utc_to_local(utc)?, local);
    Ok(())
}

/// Keeping the wall clock time while moving from London to Paris in the
/// summer yields an instant one hour earlier.
#[test]
fn keep_local_between_zones() -> Result {
    let london = zone("Europe/London");
    let paris = zone("Europe/Paris");
    assert_eq!(
        TimeZone::convert_local(&london, &paris, SUMMER)?,
        SUMMER - 3_600_000,
    );
    assert_eq!(TimeZone::convert_local(&london, &london, SUMMER)?, SUMMER);
    Ok(())
}

#[test]
fn zoned_fields_across_transition() -> Result {
    let chrono = Chronology::iso(zone("Europe/London"));

    assert_eq!(chrono.hour_of_day().get(SUMMER), 13);
    assert_eq!(chrono.hour_of_day().get(WINTER), 12);

    // A day later on the wall clock is only 23 hours later.
    let saturday_noon = 1_017_489_600_000;
    let sunday_noon = chrono.day_of_month().add(saturday_noon, 1)?;
    assert_eq!(sunday_noon - saturday_noon, 23 * 3_600_000);
    assert_eq!(chrono.hour_of_day().get(sunday_noon), 12);

    // An hour later is always exactly an hour later.
    let before = LONDON_2002_SPRING - 1_800_000;
    let after = chrono.hour_of_day().add(before, 1)?;
    assert_eq!(after - before, 3_600_000);
    assert_eq!(chrono.hour_of_day().get(after), 2);

    // There is no 01:30 on that day.
    let err = chrono.hour_of_day().set(before, 1).unwrap_err();
    assert!(err.is_invalid_field_value(), "{err}");
    Ok(())
}

#[test]
fn offset_ids() -> Result {
    let tz = TimeZone::fixed(-(4 * 3_600_000 + 45 * 60_000 + 17_045))?;
    assert_eq!(tz.id(), "-04:45:17.045");
    assert!(TimeZone::fixed(0)?.is_utc());
    assert!(TimeZone::fixed(86_400_000).is_err());
    Ok(())
}
