//! Errors raised while loading an instance.

use std::fmt;

/// Coarse classification of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The file could not be opened or read.
    IoFailure,
    /// The content does not follow the instance format.
    MalformedInput,
}

/// The error type for the instance loading process.
#[derive(Debug)]
pub enum LoadError {
    /// An I/O error occurred while reading the input stream.
    Io(std::io::Error),
    /// The input ended before the named section was read.
    UnexpectedEof {
        /// Section that was expected next.
        section: &'static str,
    },
    /// A line does not match the format.
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line, verbatim.
        content: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl LoadError {
    /// Returns the error classification.
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::Io(_) => LoadErrorKind::IoFailure,
            Self::UnexpectedEof { .. } | Self::Malformed { .. } => LoadErrorKind::MalformedInput,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Could not read instance file: {e}"),
            Self::UnexpectedEof { section } => {
                write!(f, "Unexpected end of input while reading {section}")
            }
            Self::Malformed {
                line,
                content,
                reason,
            } => write!(f, "Error with line {line} '{content}': {reason}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_echoes_line() {
        let err = LoadError::Malformed {
            line: 4,
            content: "1 0 1".into(),
            reason: "expected 4 values, found 3".into(),
        };
        assert_eq!(
            err.to_string(),
            "Error with line 4 '1 0 1': expected 4 values, found 3"
        );
    }

    #[test]
    fn test_io_kind() {
        let err: LoadError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), LoadErrorKind::IoFailure);
        assert!(std::error::Error::source(&err).is_some());
    }
}
