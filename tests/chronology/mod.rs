use std::{sync::Arc, time::SystemTime};

use calendrical::{
    chrono::Chronology,
    convert::ToInstant,
    duration::DurationFieldType,
    field::{
        DateTimeField, DateTimeFieldType, DividedDateTimeField,
        RemainderDateTimeField,
    },
    tz::TimeZone,
};

use crate::{zone, Result};

/// A century built by dividing the year by 100 floors negative years.
#[test]
fn century_of_negative_year() -> Result {
    let chrono = Chronology::iso_utc();
    let year = Arc::clone(chrono.year());
    let century = DividedDateTimeField::new(
        DateTimeFieldType::CenturyOfEra,
        Arc::clone(&year),
        DurationFieldType::Centuries,
        100,
    )?;
    let year_of_century = RemainderDateTimeField::from_divided(
        DateTimeFieldType::YearOfCentury,
        &century,
    );

    let instant = year.set(0, -50)?;
    assert_eq!(year.get(instant), -50);
    assert_eq!(century.get(instant), -1);
    assert_eq!(year_of_century.get(instant), 50);

    for y in [-1001, -201, -200, -199, -101, -100, -99, -1, 0, 1, 99, 2002] {
        let instant = year.set(0, y)?;
        let c = century.get(instant);
        let r = year_of_century.get(instant);
        assert_eq!(c, y.div_euclid(100), "year {y}");
        assert_eq!(c * 100 + r, y, "year {y}");
    }
    Ok(())
}

/// Setting a field to the value it already has doesn't move the instant,
/// for every field of several chronologies.
#[test]
fn set_get_identity() -> Result {
    let chronologies = [
        Chronology::iso_utc(),
        Chronology::julian(TimeZone::UTC),
        Chronology::iso(TimeZone::fixed(-9_000_000)?),
        Chronology::iso(zone("America/New_York")),
    ];
    let instants = [
        i64::MIN / 2,
        -62_135_596_800_001,
        -1,
        0,
        951_782_400_000,
        1_173_598_200_000,
        1_194_154_200_000,
        i64::MAX / 2,
    ];
    for chrono in chronologies.iter() {
        for ty in DateTimeFieldType::ALL.iter().copied() {
            let field = chrono.field(ty)?;
            for &instant in instants.iter() {
                let value = field.get(instant);
                assert_eq!(
                    field.set(instant, value)?,
                    instant,
                    "{chrono:?} {ty:?} at {instant}",
                );
            }
        }
    }
    Ok(())
}

#[test]
fn month_arithmetic_clamps() -> Result {
    let chrono = Chronology::iso_utc();
    let jan31 = chrono.date_time_millis(2024, 1, 31, 8, 0, 0, 0)?;
    let feb = chrono.month_of_year().add(jan31, 1)?;
    assert_eq!(feb, chrono.date_time_millis(2024, 2, 29, 8, 0, 0, 0)?);
    // A month later and back isn't where we started.
    let back = chrono.month_of_year().add(feb, -1)?;
    assert_eq!(chrono.day_of_month().get(back), 29);
    // But the difference in months stays consistent with adding.
    let months = chrono.month_of_year().difference(jan31, feb)?;
    assert_eq!(months, -1);
    assert!(chrono.month_of_year().add(feb, months)? <= jan31);
    Ok(())
}

#[test]
fn strict_constructor() {
    let chrono = Chronology::iso_utc();
    for (y, mo, d, h, mi, s, ms) in [
        (2023, 2, 29, 0, 0, 0, 0),
        (2024, 13, 1, 0, 0, 0, 0),
        (2024, 1, 0, 0, 0, 0, 0),
        (2024, 1, 1, 24, 0, 0, 0),
        (2024, 1, 1, 0, 60, 0, 0),
        (2024, 1, 1, 0, 0, 60, 0),
        (2024, 1, 1, 0, 0, 0, 1000),
    ] {
        let err = chrono.date_time_millis(y, mo, d, h, mi, s, ms).unwrap_err();
        assert!(err.is_invalid_field_value(), "{err}");
    }
}

#[test]
fn unsupported_and_overflow() -> Result {
    let chrono = Chronology::iso_utc();
    let eras = chrono.duration_field(DurationFieldType::Eras)?;
    assert!(!eras.is_supported());
    assert!(eras.add(0, 1).unwrap_err().is_unsupported_field());

    let err = chrono.year().add(i64::MAX - 1, 1).unwrap_err();
    assert!(err.is_overflow(), "{err}");
    let err = chrono.millis_of_second().add(i64::MIN, -1).unwrap_err();
    assert!(err.is_overflow(), "{err}");
    Ok(())
}

#[test]
fn julian_and_iso_differ() -> Result {
    let iso = Chronology::iso_utc();
    let julian = Chronology::julian(TimeZone::UTC);
    // The day after 1582-10-04 (Julian) is 1582-10-15 (Gregorian).
    let last_julian = julian.date_time_millis(1582, 10, 4, 0, 0, 0, 0)?;
    let first_gregorian = iso.date_time_millis(1582, 10, 15, 0, 0, 0, 0)?;
    assert_eq!(first_gregorian - last_julian, 86_400_000);
    assert_ne!(iso, julian);
    assert_eq!(julian, Chronology::julian(TimeZone::UTC));
    Ok(())
}

#[test]
fn converted_instants() -> Result {
    let chrono = Chronology::iso_utc();
    let now = SystemTime::now();
    let instant = now.to_instant()?;
    assert!(chrono.year().get(instant) >= 2024);

    let london = Chronology::iso(zone("Europe/London"));
    let value = (1_025_524_800_000i64, london.clone());
    let preferred = value.chronology().unwrap_or_else(Chronology::iso_utc);
    assert_eq!(preferred, london);
    assert_eq!(preferred.hour_of_day().get(value.to_instant()?), 13);
    Ok(())
}
