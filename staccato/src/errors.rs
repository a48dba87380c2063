//! Definition of errors.

use std::fmt;

/// A specialized Result type for Staccato.
pub type Result<T, E = StaccatoError> = std::result::Result<T, E>;

/// The error type for Staccato.
#[derive(Debug, thiserror::Error)]
pub enum StaccatoError {
    /// The error variant for [`InvalidArgumentError`].
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgumentError),

    /// The error variant for [`InvalidFormatError`].
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormatError),

    /// The error variant for [`InvalidStateError`].
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// The error variant for [`std::io::Error`].
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl StaccatoError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }
}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl std::error::Error for InvalidArgumentError {}

/// Error used when the input format is invalid.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Name of the format.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl std::error::Error for InvalidFormatError {}

/// Error used when the state is invalid.
#[derive(Debug)]
pub struct InvalidStateError {
    /// Error message.
    pub(crate) msg: String,

    /// Underlying cause of the error.
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl std::error::Error for InvalidStateError {}
