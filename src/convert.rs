/*!
Conversions from other representations of time into instants.

A [`ToInstant`] converter yields a millisecond instant and may also name
the [`Chronology`] the value prefers.

# Example

```
use std::time::{Duration, SystemTime};

use calendrical::convert::ToInstant;

let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500);
assert_eq!(time.to_instant()?, 1_500);
assert!(time.chronology().is_none());

# Ok::<(), calendrical::Error>(())
```
*/

use std::time::SystemTime;

use crate::{chrono::Chronology, Error};

/// A value that can be converted into a millisecond instant.
pub trait ToInstant {
    /// Returns the number of milliseconds since 1970-01-01T00:00:00Z that
    /// this value represents.
    ///
    /// # Errors
    ///
    /// This returns an error when the value can't be represented as a
    /// signed 64-bit number of milliseconds.
    fn to_instant(&self) -> Result<i64, Error>;

    /// Returns the chronology this value should be interpreted in, if it
    /// carries one. By default, values don't.
    fn chronology(&self) -> Option<Chronology> {
        None
    }
}

impl ToInstant for i64 {
    fn to_instant(&self) -> Result<i64, Error> {
        Ok(*self)
    }
}

/// System times before the epoch are floored to the millisecond.
impl ToInstant for SystemTime {
    fn to_instant(&self) -> Result<i64, Error> {
        let unix_epoch = SystemTime::UNIX_EPOCH;
        let (duration, sign) = match self.duration_since(unix_epoch) {
            Ok(duration) => (duration, 1),
            Err(err) => (err.duration(), -1),
        };
        let mut millis = i128::try_from(duration.as_millis())
            .map_err(|_| Error::overflow("system time to instant"))?;
        if sign < 0 {
            millis = -millis;
            if duration.subsec_nanos() % 1_000_000 != 0 {
                millis -= 1;
            }
        }
        i64::try_from(millis)
            .map_err(|_| Error::overflow("system time to instant"))
    }
}

impl ToInstant for (i64, Chronology) {
    fn to_instant(&self) -> Result<i64, Error> {
        Ok(self.0)
    }

    fn chronology(&self) -> Option<Chronology> {
        Some(self.1.clone())
    }
}
