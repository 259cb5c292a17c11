use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("unexpected closing parenthesis")]
    UnexpectedCloseParen,

    #[error("missing closing parenthesis for {0}")]
    MissingClosingParen(String),

    #[error("forms nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("malformed special form: {0}")]
    MalformedSpecialForm(String),

    #[error("invalid JSON document: {0}")]
    DecodeError(#[source] serde_json::Error),

    #[error("cannot encode document: {0}")]
    EncodeError(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn missing_paren(construct: impl Into<String>) -> Error {
        Error::MissingClosingParen(construct.into())
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Error {
        Error::MalformedSpecialForm(reason.into())
    }

    /// Whether appending more text could still make the input valid.
    pub fn is_incomplete(&self) -> bool {
        match self {
            Error::UnexpectedEndOfInput | Error::MissingClosingParen(_) => true,
            Error::DecodeError(err) => err.is_eof(),
            _ => false,
        }
    }
}
