use thiserror::Error;

/// A malformed pattern.
///
/// Only raised by compilation, never by matching.
///
/// ```
/// use ib_regexp::{ErrorKind, Regex};
///
/// let err = Regex::new("(abc").unwrap_err();
/// assert_eq!(err.kind(), &ErrorKind::UnmatchedLeftParen);
/// assert_eq!(err.pos(), 0);
/// assert_eq!(err.to_string(), "unmatched '(' at position 0");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at position {pos}")]
pub struct SyntaxError {
    pub(crate) pos: usize,
    pub(crate) kind: ErrorKind,
}

impl SyntaxError {
    pub(crate) fn new(kind: ErrorKind, pos: usize) -> Self {
        Self { pos, kind }
    }

    /// Char (not byte) offset into the pattern.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("unmatched '('")]
    UnmatchedLeftParen,
    #[error("unmatched ')'")]
    UnmatchedRightParen,
    #[error("unterminated bracket expression")]
    UnterminatedBracket,
    #[error("invalid interval {{{min},{max}}}")]
    InvalidInterval { min: usize, max: usize },
    #[error("malformed interval")]
    MalformedInterval,
    #[error("unknown POSIX class '{0}'")]
    UnknownPosixClass(String),
    #[error("trailing backslash")]
    TrailingEscape,
    #[error("reversed range '{0}-{1}'")]
    EmptyRange(char, char),
    #[error("nothing to repeat")]
    NothingToRepeat,
    #[error("backreference to undefined group {0}")]
    UndefinedGroup(usize),
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unknown group flag '{0}'")]
    UnknownGroupFlag(char),
}

/// A [`Syntax`](crate::Syntax) name that is not one of the predefined dialects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown syntax '{0}'")]
pub struct UnknownSyntax(pub String);
