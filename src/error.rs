use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

use crate::model::Env;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Parse(ParseError),
    InvalidEncoding(std::str::Utf8Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::InvalidEncoding(err) => write!(f, "invalid UTF-8 input: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidEncoding(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(value: std::str::Utf8Error) -> Self {
        Self::InvalidEncoding(value)
    }
}

/// A line that is neither blank, a comment, nor a valid assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number within the input stream.
    pub line: u32,
    /// The offending raw line text, terminator stripped.
    pub text: String,
    /// Pairs accumulated from the lines before the offending one. A strict
    /// parse aborts on the first bad line but the valid prefix survives here.
    pub partial: Env,
}

impl ParseError {
    pub(crate) fn new(line: u32, text: impl Into<String>, partial: Env) -> Self {
        Self {
            line,
            text: text.into(),
            partial,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: `{}` does not match key/value format",
            self.line, self.text
        )
    }
}

impl StdError for ParseError {}
