use crate::error;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    InvalidDivisor {
        divisor: i32,
    },
    InvalidPreciseUnit {
        field: &'static str,
    },
    Unsupported {
        field: &'static str,
    },
    ValueInGap {
        field: &'static str,
        given: i32,
        zone: Box<str>,
    },
    ValueOutOfRange {
        field: &'static str,
        given: i64,
        min: i64,
        max: i64,
    },
}

impl Error {
    pub(crate) fn out_of_range(
        field: &'static str,
        given: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Error {
        Error::ValueOutOfRange {
            field,
            given: given.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub(crate) fn in_gap(
        field: &'static str,
        given: i32,
        zone: &str,
    ) -> Error {
        Error::ValueInGap { field, given, zone: zone.into() }
    }
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::Field(err).into()
    }
}

impl error::IntoError for Error {
    fn into_error(self) -> error::Error {
        self.into()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use self::Error::*;

        match *self {
            InvalidDivisor { divisor } => write!(
                f,
                "composite field divisor must be at least 2, \
                 but got {divisor}",
            ),
            InvalidPreciseUnit { field } => write!(
                f,
                "field `{field}` requires precise duration fields whose \
                 range is a whole multiple of its unit",
            ),
            Unsupported { field } => {
                write!(f, "field `{field}` is not supported")
            }
            ValueInGap { field, given, ref zone } => write!(
                f,
                "value {given} for field `{field}` is illegal because it \
                 falls in a time zone offset transition gap in `{zone}`",
            ),
            ValueOutOfRange { field, given, min, max } => write!(
                f,
                "value {given} for field `{field}` \
                 is not in the required range of {min}..={max}",
            ),
        }
    }
}
