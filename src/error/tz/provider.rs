use crate::error;

#[derive(Clone, Debug)]
pub(crate) enum Error {
    ChecksumChanged { id: Box<str>, expected: u32, found: u32 },
    IndexDuplicate { line: usize, id: Box<str> },
    IndexExtraField { line: usize },
    IndexInvalidFile { line: usize, file: Box<str> },
    IndexInvalidUtf8,
    IndexMissingField { line: usize, what: &'static str },
    IndexUnknownDirective { line: usize, directive: Box<str> },
    Load { id: Box<str> },
    MissingResource { name: Box<str> },
}

impl Error {
    pub(crate) fn load(id: &str) -> Error {
        Error::Load { id: id.into() }
    }

    pub(crate) fn missing_resource(name: &str) -> Error {
        Error::MissingResource { name: name.into() }
    }
}

impl From<Error> for error::Error {
    #[cold]
    #[inline(never)]
    fn from(err: Error) -> error::Error {
        error::ErrorKind::TzProvider(err).into()
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
            ChecksumChanged { ref id, expected, found } => write!(
                f,
                "reloaded zone table for `{id}` has checksum {found:#010x}, \
                 but it was first loaded with checksum {expected:#010x}",
            ),
            IndexDuplicate { line, ref id } => write!(
                f,
                "zone index line {line}: identifier `{id}` \
                 is declared more than once",
            ),
            IndexExtraField { line } => {
                write!(f, "zone index line {line}: unexpected trailing field")
            }
            IndexInvalidFile { line, ref file } => write!(
                f,
                "zone index line {line}: file name `{file}` must be a \
                 relative path without `..` components",
            ),
            IndexInvalidUtf8 => f.write_str("zone index is not valid UTF-8"),
            IndexMissingField { line, what } => {
                write!(f, "zone index line {line}: missing {what}")
            }
            IndexUnknownDirective { line, ref directive } => write!(
                f,
                "zone index line {line}: unrecognized directive \
                 `{directive}` (expected `zone` or `link`)",
            ),
            Load { ref id } => write!(f, "failed to load zone `{id}`"),
            MissingResource { ref name } => {
                write!(f, "zone resource `{name}` does not exist")
            }
        }
    }
}
