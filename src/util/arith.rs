/*!
Checked integer helpers shared by every field implementation.

All instants in this crate are signed 64-bit millisecond counts, and all
field arithmetic must report overflow instead of wrapping. These helpers
centralize that, along with floor-based division, which is what every
calendar computation wants when instants precede the epoch.
*/

use crate::Error;

pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub(crate) const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub(crate) const MILLIS_PER_HALFDAY: i64 = 12 * MILLIS_PER_HOUR;
pub(crate) const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
pub(crate) const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

/// Floor division. The divisor must be positive.
///
/// Unlike `/`, this rounds toward negative infinity, so `floor_div(-50, 100)`
/// is `-1`.
#[inline]
pub(crate) fn floor_div(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0, "floor_div requires a positive divisor");
    n.div_euclid(d)
}

/// The non-negative residue corresponding to `floor_div`. The divisor must
/// be positive.
#[inline]
pub(crate) fn floor_mod(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0, "floor_mod requires a positive divisor");
    n.rem_euclid(d)
}

#[inline]
pub(crate) fn add(a: i64, b: i64, what: &'static str) -> Result<i64, Error> {
    a.checked_add(b).ok_or_else(|| Error::overflow(what))
}

#[inline]
pub(crate) fn sub(a: i64, b: i64, what: &'static str) -> Result<i64, Error> {
    a.checked_sub(b).ok_or_else(|| Error::overflow(what))
}

#[inline]
pub(crate) fn mul(a: i64, b: i64, what: &'static str) -> Result<i64, Error> {
    a.checked_mul(b).ok_or_else(|| Error::overflow(what))
}

/// Narrows a 64-bit value to a field value, reporting overflow when it
/// doesn't fit.
#[inline]
pub(crate) fn to_i32(v: i64, what: &'static str) -> Result<i32, Error> {
    i32::try_from(v).map_err(|_| Error::overflow(what))
}

/// Adds `amount` to `value` and wraps the result into the inclusive range
/// `min..=max`. `value` must already be in range.
///
/// This is what `add_wrapped` uses: the result cycles through the range
/// without carrying into any larger field.
pub(crate) fn wrap_add(value: i32, amount: i64, min: i32, max: i32) -> i32 {
    let (value, min, max) = (i64::from(value), i64::from(min), i64::from(max));
    let len = max - min + 1;
    let offset = floor_mod(value - min + floor_mod(amount, len), len);
    // OK because the result is in `min..=max`, which came from i32s.
    (min + offset) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division() {
        assert_eq!(floor_div(-50, 100), -1);
        assert_eq!(floor_div(-100, 100), -1);
        assert_eq!(floor_div(-101, 100), -2);
        assert_eq!(floor_div(99, 100), 0);
        assert_eq!(floor_mod(-50, 100), 50);
        assert_eq!(floor_mod(-1, 7), 6);
        assert_eq!(floor_mod(-1, MILLIS_PER_DAY), MILLIS_PER_DAY - 1);
    }

    #[test]
    fn wrapping() {
        assert_eq!(wrap_add(12, 1, 1, 12), 1);
        assert_eq!(wrap_add(1, -1, 1, 12), 12);
        assert_eq!(wrap_add(0, -1, 0, 59), 59);
        assert_eq!(wrap_add(0, 120, 0, 59), 0);
        assert_eq!(wrap_add(12, 13, 1, 12), 1);
        assert_eq!(wrap_add(0, i64::MAX, 0, 0), 0);
        assert_eq!(wrap_add(3, i64::MIN, 1, 7), 2);
    }

    #[test]
    fn checked() {
        assert!(add(i64::MAX, 1, "test").unwrap_err().is_overflow());
        assert!(sub(i64::MIN, 1, "test").unwrap_err().is_overflow());
        assert!(mul(i64::MAX / 2, 3, "test").unwrap_err().is_overflow());
        assert!(to_i32(i64::from(i32::MAX) + 1, "test").is_err());
        assert_eq!(add(1, 2, "test").unwrap(), 3);
    }

    quickcheck::quickcheck! {
        fn prop_floor_div_mod(n: i64, d: i64) -> quickcheck::TestResult {
            if d <= 0 {
                return quickcheck::TestResult::discard();
            }
            let q = floor_div(n, d);
            let r = floor_mod(n, d);
            let recombined = i128::from(q) * i128::from(d) + i128::from(r);
            let ok = 0 <= r && r < d && recombined == i128::from(n);
            quickcheck::TestResult::from_bool(ok)
        }
    }
}
