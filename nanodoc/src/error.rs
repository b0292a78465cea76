// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while parsing, serializing, or building a document.
///
/// This is a closed taxonomy: parsers return the first error encountered and
/// stop. No partial-state rollback is performed, so a document that failed
/// mid-parse may contain a partially built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The input was null or contained no non-whitespace bytes.
    EmptyInput,
    /// A token, string, escape sequence, or container was truncated;
    /// more bytes were expected.
    IncompleteInput,
    /// The input contains bytes that cannot be part of any valid token in
    /// the current state.
    InvalidInput,
    /// An allocation (value slot or string) failed; the document's
    /// overflow flag is set until it is cleared.
    NoMemory,
    /// The nesting limit was reached while descending into a container.
    TooDeep,
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "input is empty"),
            Error::IncompleteInput => write!(f, "input ended in the middle of a token"),
            Error::InvalidInput => write!(f, "input is not valid in the current state"),
            Error::NoMemory => write!(f, "memory pool exhausted"),
            Error::TooDeep => write!(f, "nesting limit exceeded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::EmptyInput.to_string(), "input is empty");
        assert_eq!(Error::NoMemory.to_string(), "memory pool exhausted");
        assert_eq!(Error::TooDeep.to_string(), "nesting limit exceeded");
    }

    #[test]
    fn test_errors_are_comparable() {
        assert_eq!(Error::InvalidInput, Error::InvalidInput);
        assert_ne!(Error::InvalidInput, Error::IncompleteInput);
    }
}
