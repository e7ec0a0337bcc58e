use crate::error;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    InvalidOffsetId { id: Box<str> },
    LocalTimeInGap { local: i64, zone: Box<str> },
    NotFound { id: Box<str> },
    OffsetOutOfRange { offset: i64 },
}

impl Error {
    pub(crate) fn not_found(id: &str) -> Error {
        Error::NotFound { id: id.into() }
    }

    pub(crate) fn local_time_in_gap(local: i64, zone: &str) -> Error {
        Error::LocalTimeInGap { local, zone: zone.into() }
    }
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::TzZone(err).into()
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
            InvalidOffsetId { ref id } => write!(
                f,
                "`{id}` is not a valid fixed offset identifier \
                 (expected `UTC` or `+HH:MM[:SS[.mmm]]`)",
            ),
            LocalTimeInGap { local, ref zone } => write!(
                f,
                "local instant {local} does not exist in time zone \
                 `{zone}` because of an offset transition gap",
            ),
            NotFound { ref id } => write!(
                f,
                "failed to find time zone `{id}` in the configured provider",
            ),
            OffsetOutOfRange { offset } => write!(
                f,
                "offset of {offset}ms is not strictly within one day of UTC",
            ),
        }
    }
}
