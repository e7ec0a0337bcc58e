use crate::error;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    Empty,
    IdInvalidUtf8,
    IdMismatch { expected: Box<str>, found: Box<str> },
    IdTooLong { len: usize },
    InvalidOffset { index: usize, offset: i32 },
    MismatchMagic,
    NameInvalidUtf8 { index: usize },
    NameTooLong { index: usize, len: usize },
    NotIncreasing { index: usize },
    TrailingBytes { len: usize },
    Truncated { what: &'static str },
    UnsupportedVersion { version: u8 },
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::TzTable(err).into()
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
            Empty => f.write_str(
                "zone table must contain at least one record \
                 describing its initial offset",
            ),
            IdInvalidUtf8 => {
                f.write_str("zone table identifier is not valid UTF-8")
            }
            IdMismatch { ref expected, ref found } => write!(
                f,
                "zone table identifier `{found}` does not match \
                 requested identifier `{expected}`",
            ),
            IdTooLong { len } => write!(
                f,
                "zone table identifier has length {len}, \
                 which exceeds the maximum of {max}",
                max = u16::MAX,
            ),
            InvalidOffset { index, offset } => write!(
                f,
                "zone table record {index} has offset {offset}ms, \
                 which is not strictly within one day of UTC",
            ),
            MismatchMagic => {
                f.write_str("zone table has unrecognized magic header")
            }
            NameInvalidUtf8 { index } => write!(
                f,
                "zone table record {index} has a name key \
                 that is not valid UTF-8",
            ),
            NameTooLong { index, len } => write!(
                f,
                "zone table record {index} has a name key of length {len}, \
                 which exceeds the maximum of {max}",
                max = u8::MAX,
            ),
            NotIncreasing { index } => write!(
                f,
                "zone table record {index} has a transition instant that \
                 is not strictly greater than the previous record",
            ),
            TrailingBytes { len } => write!(
                f,
                "zone table has {len} unexpected trailing bytes \
                 after its last record",
            ),
            Truncated { what } => write!(
                f,
                "zone table is truncated: expected more bytes for {what}",
            ),
            UnsupportedVersion { version } => write!(
                f,
                "zone table has unsupported format version {version}",
            ),
        }
    }
}
