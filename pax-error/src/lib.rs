//! Error handling for the PAX crates.
//!
//! Every fallible operation in the workspace returns a [`PaxResult`]. The
//! [`PaxError`] variants form the complete failure taxonomy of the codec;
//! there is no out-of-band status state anywhere.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// A string that can be owned or static, used for error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The top-level error type for all PAX operations.
#[derive(Debug, thiserror::Error)]
pub enum PaxError {
    /// The input is shorter than the minimum valid PAX stream.
    #[error("file too short: {0}")]
    FileTooShort(ErrString),
    /// The `PAX<code>` type line is missing or malformed.
    #[error("invalid PAX tag: {0}")]
    InvalidTag(ErrString),
    /// A type code or tag is not in the registry.
    #[error("unknown type: {0}")]
    UnknownType(ErrString),
    /// `bpv`, `vpe`, or the data length disagree with the declared type.
    #[error("invalid shape: {0}")]
    InvalidShape(ErrString),
    /// No `DATA_LENGTH` line was found before the end of the buffer.
    ///
    /// This is the signaling value used by header preview to request more
    /// input; it is not necessarily fatal.
    #[error("incomplete header: {0}")]
    IncompleteHeader(ErrString),
    /// Fewer raster bytes remain than the header declared.
    #[error("truncated payload: {0}")]
    TruncatedPayload(ErrString),
    /// A `##` metadata line could not be parsed.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(ErrString),
    /// A metadata name lookup failed.
    #[error("unknown metadata: {0}")]
    UnknownMetadata(ErrString),
    /// A typed accessor was called for an incompatible kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(ErrString),
    /// An array access with out-of-bounds indices or the wrong arity.
    #[error("index out of range: {0}")]
    IndexOutOfRange(ErrString),
    /// An I/O failure, surfaced only by facade helpers that perform I/O.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type PaxResult<T> = Result<T, PaxError>;

/// Construct a [`PaxError`] of the given variant from a format string.
#[macro_export]
macro_rules! pax_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::PaxError::$variant($crate::ErrString::from(format!($fmt $(, $arg)*)))
    };
}

/// Return early with a [`PaxError`] of the given variant.
#[macro_export]
macro_rules! pax_bail {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::pax_err!($variant: $fmt $(, $arg)*))
    };
}

/// Panic with a [`PaxError`], for conditions that indicate a bug rather
/// than bad input.
#[macro_export]
macro_rules! pax_panic {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        panic!("{}", $crate::pax_err!($variant: $fmt $(, $arg)*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        panic!("{}", format!($fmt $(, $arg)*))
    };
}

/// Expect a value to be present or successful, panicking with context
/// otherwise. Reserved for invariants the caller has already established.
pub trait PaxExpect {
    type Output;

    fn pax_expect(self, msg: &str) -> Self::Output;
}

impl<T> PaxExpect for Option<T> {
    type Output = T;

    fn pax_expect(self, msg: &str) -> T {
        match self {
            Some(value) => value,
            None => pax_panic!("expected Some: {}", msg),
        }
    }
}

impl<T> PaxExpect for PaxResult<T> {
    type Output = T;

    fn pax_expect(self, msg: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => pax_panic!("{}: {}", msg, e),
        }
    }
}

/// Unwrap a [`PaxResult`], panicking with the error's message.
pub trait PaxUnwrap {
    type Output;

    fn pax_unwrap(self) -> Self::Output;
}

impl<T> PaxUnwrap for PaxResult<T> {
    type Output = T;

    fn pax_unwrap(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => pax_panic!("{}", e),
        }
    }
}
