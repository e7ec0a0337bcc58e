use std::sync::Arc;

pub(crate) mod field;
pub(crate) mod tz;

/// An error that can occur in this crate.
///
/// Errors fall into four broad categories, each of which has a predicate:
///
/// * [`Error::is_invalid_field_value`]: a value given to a field setter or
/// to a constructor is outside of its legal range, and no leniency policy
/// applies. This also covers setting a field to a local time that doesn't
/// exist because of a time zone offset transition.
/// * [`Error::is_unsupported_field`]: a field or duration type was requested
/// from a chronology whose calendar system doesn't define it.
/// * [`Error::is_overflow`]: field or duration arithmetic would produce an
/// instant outside of the range of a signed 64-bit count of milliseconds.
/// * [`Error::is_zone_resource`]: a compiled zone table or provider index is
/// missing, truncated or malformed.
///
/// Other errors exist as well (for example, a failure to find a time zone
/// via [`TimeZone::get`](crate::tz::TimeZone::get)), and these do not
/// return `true` for any of the predicates above.
///
/// # Design
///
/// This crate uses a single error type for all operations. Errors are built
/// from a structured kind plus an optional cause, which forms a chain that
/// is printed from the highest level context down to the root cause. The
/// predicates above always inspect the root cause.
#[derive(Clone)]
pub struct Error {
    /// The internal representation of an error.
    ///
    /// This is in an `Arc` to make an `Error` cloneable even though it may
    /// embed a `std::io::Error`. It also keeps `Result<i64, Error>`, which is
    /// what nearly every field operation returns, small.
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Creates a new error value from `std::fmt::Arguments`.
    ///
    /// It is expected to use [`format_args!`](format_args) to create the
    /// arguments. This is useful for implementations of
    /// [`ZoneStore`](crate::tz::ZoneStore) or
    /// [`CalendarSystem`](crate::chrono::CalendarSystem) outside of this
    /// crate that need to report their own failures.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::Error;
    ///
    /// let err = Error::from_args(format_args!("something failed"));
    /// assert_eq!(err.to_string(), "something failed");
    /// ```
    pub fn from_args<'a>(message: std::fmt::Arguments<'a>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::from_args(message)))
    }

    /// Returns true when this error is the result of a field value (or a
    /// constructor argument) being outside of its legal range.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::chrono::Chronology;
    ///
    /// let chrono = Chronology::iso_utc();
    /// let err = chrono.hour_of_day().set(0, 24).unwrap_err();
    /// assert!(err.is_invalid_field_value());
    /// ```
    pub fn is_invalid_field_value(&self) -> bool {
        use self::{
            field::Error as FieldError, tz::zone::Error as ZoneError,
            ErrorKind::*,
        };

        matches!(
            *self.root().kind(),
            Field(
                FieldError::ValueOutOfRange { .. }
                    | FieldError::ValueInGap { .. }
            ) | TzZone(
                ZoneError::LocalTimeInGap { .. }
                    | ZoneError::OffsetOutOfRange { .. }
            )
        )
    }

    /// Returns true when this error is the result of asking for a field or
    /// duration type that isn't defined by a chronology.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::{chrono::Chronology, duration::DurationFieldType};
    ///
    /// let chrono = Chronology::iso_utc();
    /// let eras = chrono.duration_field(DurationFieldType::Eras).unwrap();
    /// assert!(eras.add(0, 1).unwrap_err().is_unsupported_field());
    /// ```
    pub fn is_unsupported_field(&self) -> bool {
        use self::{field::Error as FieldError, ErrorKind::*};

        matches!(*self.root().kind(), Field(FieldError::Unsupported { .. }))
    }

    /// Returns true when this error is the result of arithmetic that would
    /// exceed the representable range of instants or field values.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::chrono::Chronology;
    ///
    /// let chrono = Chronology::iso_utc();
    /// let err = chrono.millis_of_second().add(i64::MAX, 1).unwrap_err();
    /// assert!(err.is_overflow());
    /// ```
    pub fn is_overflow(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::Overflow(_))
    }

    /// Returns true when this error is the result of a compiled zone table
    /// or provider index being missing, unreadable or malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use calendrical::tz::ZoneTable;
    ///
    /// let err = ZoneTable::parse(None, b"not a zone table").unwrap_err();
    /// assert!(err.is_zone_resource());
    /// ```
    pub fn is_zone_resource(&self) -> bool {
        use self::ErrorKind::*;

        matches!(*self.root().kind(), IO(_) | TzTable(_) | TzProvider(_))
    }
}

impl Error {
    /// Creates a new error indicating that arithmetic overflowed. The given
    /// `what` label describes the quantity being computed. (e.g., "add
    /// months")
    #[inline(never)]
    #[cold]
    pub(crate) fn overflow(what: &'static str) -> Error {
        Error::from(ErrorKind::Overflow(OverflowError { what }))
    }

    /// A convenience constructor for building an I/O error.
    ///
    /// In general, callers should always attach some kind of context to this
    /// error (like a file path).
    #[inline(never)]
    #[cold]
    pub(crate) fn io(err: std::io::Error) -> Error {
        Error::from(ErrorKind::IO(IOError { err }))
    }

    /// Contextualizes this error by associating the given file path with it.
    #[inline(never)]
    #[cold]
    pub(crate) fn path(self, path: impl Into<std::path::PathBuf>) -> Error {
        let err = Error::from(ErrorKind::FilePath(FilePathError {
            path: path.into(),
        }));
        self.context(err)
    }

    pub(crate) fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        let inner = err.inner.get_or_insert_with(|| {
            Arc::new(ErrorInner { kind: ErrorKind::Unknown, cause: None })
        });
        match Arc::get_mut(inner) {
            Some(inner) if inner.cause.is_none() => {
                inner.cause = Some(self);
                err
            }
            // The consequent is shared or already has a cause. An error
            // chain is a linked list, so rather than drop the root cause
            // (which is what the predicates inspect), drop the context.
            _ => self,
        }
    }

    /// Returns the root error in this chain.
    fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) =
            err.inner.as_ref().and_then(|inner| inner.cause.as_ref())
        {
            err = cause;
        }
        err
    }

    /// Returns a chain of error values.
    ///
    /// This starts with the most recent error added to the chain. That is,
    /// the highest level context. The last error in the chain is always the
    /// root cause.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        std::iter::once(err).chain(std::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    /// Returns the kind of this error.
    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            std::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !f.alternate() {
            return std::fmt::Display::fmt(self, f);
        }
        let Some(ref inner) = self.inner else {
            return f.debug_struct("Error").field("kind", &"None").finish();
        };
        f.debug_struct("Error")
            .field("kind", &inner.kind)
            .field("cause", &inner.cause)
            .finish()
    }
}

/// The underlying kind of a [`Error`].
#[derive(Debug)]
enum ErrorKind {
    Adhoc(AdhocError),
    Field(self::field::Error),
    FilePath(FilePathError),
    IO(IOError),
    Overflow(OverflowError),
    TzProvider(self::tz::provider::Error),
    TzTable(self::tz::table::Error),
    TzZone(self::tz::zone::Error),
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use self::ErrorKind::*;

        match *self {
            Adhoc(ref msg) => msg.fmt(f),
            Field(ref err) => err.fmt(f),
            FilePath(ref err) => err.fmt(f),
            IO(ref err) => err.fmt(f),
            Overflow(ref err) => err.fmt(f),
            TzProvider(ref err) => err.fmt(f),
            TzTable(ref err) => err.fmt(f),
            TzZone(ref err) => err.fmt(f),
            Unknown => f.write_str("unknown calendrical error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { inner: Some(Arc::new(ErrorInner { kind, cause: None })) }
    }
}

/// A generic error message.
///
/// This backs the public `Error::from_args` constructor, and is used
/// internally only for messages that don't merit a structured kind.
struct AdhocError {
    message: Box<str>,
}

impl AdhocError {
    fn from_args<'a>(message: std::fmt::Arguments<'a>) -> AdhocError {
        AdhocError { message: message.to_string().into_boxed_str() }
    }
}

impl std::fmt::Display for AdhocError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.message, f)
    }
}

impl std::fmt::Debug for AdhocError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.message, f)
    }
}

/// An error that occurs when checked arithmetic fails.
#[derive(Clone, Debug)]
struct OverflowError {
    what: &'static str,
}

impl std::fmt::Display for OverflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "arithmetic overflow while computing {what}",
            what = self.what,
        )
    }
}

/// A `std::io::Error`.
struct IOError {
    err: std::io::Error,
}

impl std::fmt::Display for IOError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl std::fmt::Debug for IOError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IOError").field("err", &self.err).finish()
    }
}

struct FilePathError {
    path: std::path::PathBuf,
}

impl std::fmt::Display for FilePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl std::fmt::Debug for FilePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilePathError").field("path", &self.path).finish()
    }
}

/// A simple trait to encapsulate automatic conversion to `Error`.
///
/// This exists so that `Error::context` can accept any of the crate's
/// structured error enums without public `From` impls for each of them.
pub(crate) trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

/// A trait for contextualizing error values.
///
/// This makes it easy to contextualize either `Error` or `Result<T, Error>`
/// without calling `map_err` everywhere.
pub(crate) trait ErrorContext<T, E> {
    /// Contextualize the consequent error built by the given closure with
    /// this (`self`) error as the cause.
    ///
    /// The closure is only called on the error path.
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error>;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    E: IntoError,
{
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error> {
        self.map_err(|err| {
            err.into_error().context_impl(consequent().into_error())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // An `Error` should stay one word so that `Result<i64, Error>` stays
    // small for every field operation.
    #[test]
    fn error_size() {
        let expected_size = std::mem::size_of::<usize>();
        assert_eq!(expected_size, std::mem::size_of::<Error>());
    }

    #[test]
    fn display_chain_root_last() {
        let root = Error::overflow("add months");
        let err = root.path("/zones/Europe/London");
        assert_eq!(
            err.to_string(),
            "/zones/Europe/London: arithmetic overflow while computing \
             add months",
        );
        // Predicates look through context.
        assert!(err.is_overflow());
        assert!(!err.is_zone_resource());
    }

    #[test]
    fn io_is_zone_resource() {
        let err = Error::io(std::io::Error::from(
            std::io::ErrorKind::NotFound,
        ));
        assert!(err.is_zone_resource());
        assert!(!err.is_invalid_field_value());
    }

    #[test]
    fn adhoc_is_uncategorized() {
        let err = Error::from_args(format_args!("custom {}", 5));
        assert_eq!(err.to_string(), "custom 5");
        assert!(!err.is_overflow());
        assert!(!err.is_unsupported_field());
        assert!(!err.is_invalid_field_value());
        assert!(!err.is_zone_resource());
    }
}
