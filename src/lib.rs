/*!
Calendar arithmetic over millisecond instants.

This crate provides the building blocks that date and time value types are
made of: calendar fields that read and write one component of an instant
(the year, the hour of the day and so on), the duration units those fields
are measured in, calendar systems that drive them, and time zones that map
instants to wall clock time. It deliberately stops there. Parsing,
formatting and value types like "a date" or "a zoned date and time" are for
higher level crates to build on top.

An *instant* is a signed 64-bit count of milliseconds since
1970-01-01T00:00:00Z. Every operation in this crate takes and returns
instants.

# Overview

* A [`Chronology`](chrono::Chronology) binds a calendar system to a
[`TimeZone`](tz::TimeZone) and exposes the calendar's complete set of
[fields](field::DateTimeField) and [duration units](duration::DurationField).
* A [`TimeZone`](tz::TimeZone) is either a fixed offset from UTC or a table of
historical offset transitions.
* A [`Provider`](tz::Provider) resolves identifiers like `Europe/London` to
time zones. Tables are loaded lazily from a [store](tz::ZoneStore) and held
in an evictable cache.
* The [`config`] module holds the process-wide provider and default zone,
which can be replaced explicitly.

# Example

```
use calendrical::{
    chrono::Chronology,
    field::{DateTimeField, DateTimeFieldType},
};

let chrono = Chronology::iso_utc();
// 2002-03-31T01:00:00Z
let instant = chrono.date_time_millis(2002, 3, 31, 1, 0, 0, 0)?;
assert_eq!(instant, 1_017_536_400_000);

// Adding a month clamps the day of month to the end of April.
let next = chrono.month_of_year().add(instant, 1)?;
assert_eq!(chrono.day_of_month().get(next), 30);

let century = chrono.field(DateTimeFieldType::CenturyOfEra)?;
assert_eq!(century.get(instant), 20);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Errors

Every fallible operation returns [`Error`]. Errors can be classified with
predicates like [`Error::is_invalid_field_value`] and
[`Error::is_overflow`].

# Crate features

* **logging** (enabled by default) - Emits log messages through the `log`
crate when zone tables are loaded or evicted, when a provider is built, and
when the process configuration is resolved. Field arithmetic never logs.
*/

#![deny(rustdoc::broken_intra_doc_links)]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

pub use crate::{chrono::Chronology, error::Error, tz::TimeZone};

#[macro_use]
mod logging;

pub mod chrono;
pub mod config;
pub mod convert;
pub mod duration;
mod error;
pub mod field;
pub mod tz;
mod util;
