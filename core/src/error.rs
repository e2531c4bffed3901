//! Error codes and the single-slot error latch.
//!
//! Two code spaces share one integer representation at the C boundary:
//! negative codes are generic failures defined here, non-negative codes index
//! into the message table of the backend bound to a handle. In Rust the two
//! are kept apart by [`ErrorCode`].

use std::fmt::{Display, Formatter};

/// Messages of the generic errors, in code order: `-1` is the first entry.
pub const GENERIC_ERRORS: [&str; 4] = [
    "Hardware supplied no transceive implementation.",
    "Timed out polling for value.",
    "Invalid EseInterface handle.",
    "Hardware supplied no implementation for this operation.",
];

/// Hardware independent failures.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum GenericError {
    /// The backend offers neither a unified nor a split I/O capability.
    NoTransceive = 0,

    /// A polling backend did not see the expected value in time.
    PollTimedOut = 1,

    /// A null handle was passed to an operation.
    InvalidHandle = 2,

    /// The backend does not offer the requested optional operation.
    Unsupported = 3,
}

impl GenericError {
    /// Returns the message associated with this error.
    pub const fn message(self) -> &'static str {
        GENERIC_ERRORS[self as usize]
    }

    /// Returns the raw (negative) code of this error.
    pub const fn raw(self) -> i32 {
        -(self as i32 + 1)
    }

    /// Resolves a raw negative code.
    pub const fn from_raw(code: i32) -> Option<Self> {
        use GenericError::*;

        match code {
            -1 => Some(NoTransceive),
            -2 => Some(PollTimedOut),
            -3 => Some(InvalidHandle),
            -4 => Some(Unsupported),
            _ => None,
        }
    }
}

impl Display for GenericError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for GenericError {}

/// A failure defined by a backend, resolved against its [`ErrorTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BackendError {
    code: u32,
    message: &'static str,
}

impl BackendError {
    /// Index of the error in the backend's table.
    pub const fn code(&self) -> u32 {
        self.code
    }

    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for BackendError {}

/// The fixed message table a backend ships with.
#[derive(Copy, Clone, Debug)]
pub struct ErrorTable(&'static [&'static str]);

impl ErrorTable {
    /// A table for backends that define no errors of their own.
    pub const EMPTY: Self = Self(&[]);

    pub const fn new(messages: &'static [&'static str]) -> Self {
        Self(messages)
    }

    /// Number of backend errors, the upper bound of backend codes.
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the error for `code`.
    ///
    /// Meant for `const` items: an out-of-range code fails the build there.
    /// At runtime it panics, use [`ErrorTable::get`] for untrusted codes.
    pub const fn error(&self, code: u32) -> BackendError {
        BackendError {
            code,
            message: self.0[code as usize],
        }
    }

    /// Looks up the error for `code`, if the table has one.
    pub fn get(&self, code: u32) -> Option<BackendError> {
        self.0
            .get(code as usize)
            .map(|&message| BackendError { code, message })
    }
}

/// The code half of an error, tagged by namespace.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorCode {
    Generic(GenericError),
    Backend(u32),
}

impl ErrorCode {
    /// Splits a raw integer code into its namespace.
    /// Returns `None` for negative codes with no generic counterpart.
    pub const fn from_raw(code: i32) -> Option<Self> {
        if code < 0 {
            match GenericError::from_raw(code) {
                Some(e) => Some(Self::Generic(e)),
                None => None,
            }
        } else {
            Some(Self::Backend(code as u32))
        }
    }

    /// Flattens the code back to its integer representation.
    pub const fn raw(self) -> i32 {
        match self {
            Self::Generic(e) => e.raw(),
            Self::Backend(code) => code as i32,
        }
    }

    /// Resolves the message of the code, backend codes against `table`.
    pub fn resolve(self, table: &ErrorTable) -> Option<Error> {
        match self {
            Self::Generic(e) => Some(Error::Generic(e)),
            Self::Backend(code) => table.get(code).map(Error::Backend),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// An error reported through an interface handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Generic(#[from] GenericError),

    #[error("{0}")]
    Backend(#[from] BackendError),
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Generic(e) => ErrorCode::Generic(*e),
            Self::Backend(e) => ErrorCode::Backend(e.code),
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            Self::Generic(e) => e.message(),
            Self::Backend(e) => e.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Single-slot latch holding the most recent error of a handle.
#[derive(Copy, Clone, Debug, Default)]
pub struct ErrorState {
    latched: Option<Error>,
}

impl ErrorState {
    /// Latches `error`, discarding whatever was there before.
    pub fn set(&mut self, error: Error) {
        self.latched = Some(error);
    }

    pub fn clear(&mut self) {
        self.latched = None;
    }

    pub fn get(&self) -> Option<Error> {
        self.latched
    }

    pub fn is_err(&self) -> bool {
        self.latched.is_some()
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.latched.map(|e| e.code())
    }

    pub fn message(&self) -> Option<&'static str> {
        self.latched.map(|e| e.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: ErrorTable = ErrorTable::new(&["zero", "one", "two"]);
    const TWO: BackendError = TABLE.error(2);

    #[test]
    fn test_generic_codes() {
        assert_eq!(-1, GenericError::NoTransceive.raw());
        assert_eq!(-2, GenericError::PollTimedOut.raw());
        assert_eq!(GENERIC_ERRORS[0], GenericError::NoTransceive.message());
        assert_eq!(GENERIC_ERRORS[1], GenericError::PollTimedOut.message());
        assert_eq!(None, GenericError::from_raw(-5));
        assert_eq!(None, GenericError::from_raw(0));
    }

    #[test]
    fn test_error_code_from_raw() {
        assert_eq!(
            Some(ErrorCode::Generic(GenericError::InvalidHandle)),
            ErrorCode::from_raw(-3),
        );
        assert_eq!(Some(ErrorCode::Backend(0)), ErrorCode::from_raw(0));
        assert_eq!(Some(ErrorCode::Backend(7)), ErrorCode::from_raw(7));
        assert_eq!(None, ErrorCode::from_raw(-42));
    }

    #[test]
    fn test_resolve_against_table() {
        assert_eq!(Some(Error::Backend(TWO)), ErrorCode::Backend(2).resolve(&TABLE));
        assert_eq!(None, ErrorCode::Backend(3).resolve(&TABLE));
        assert_eq!(
            Some(Error::Generic(GenericError::NoTransceive)),
            ErrorCode::Generic(GenericError::NoTransceive).resolve(&ErrorTable::EMPTY),
        );
    }

    #[test]
    fn test_error_message_and_display() {
        let error = Error::from(TWO);

        assert_eq!(ErrorCode::Backend(2), error.code());
        assert_eq!("two", error.message());
        assert_eq!("two", error.to_string());
        assert_eq!(
            "Timed out polling for value.",
            Error::from(GenericError::PollTimedOut).to_string(),
        );
    }

    #[test]
    fn test_latch_keeps_only_the_latest() {
        let mut state = ErrorState::default();
        assert!(!state.is_err());
        assert_eq!(None, state.code());

        state.set(GenericError::PollTimedOut.into());
        state.set(TWO.into());

        assert!(state.is_err());
        assert_eq!(Some(ErrorCode::Backend(2)), state.code());
        assert_eq!(Some("two"), state.message());

        state.clear();
        assert_eq!(None, state.get());
    }
}
