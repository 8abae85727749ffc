use std::io;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Everything that can go wrong while turning a byte stream into a book.
///
/// All variants abort the parse; there is no partial-success mode, so a
/// failed parse never exposes a half-built book.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The stream could not be read at all.
    #[error("could not read input")]
    Io(#[from] io::Error),

    /// The document is not valid GNU Cash v2 XML, or a scalar value inside
    /// it (rational number, timestamp) is malformed.
    #[error("not a valid GNU Cash v2 XML document: {0}")]
    Format(String),

    /// A schema-mandated child element is absent.
    #[error("required element `{element}` missing under `{parent}`")]
    RequiredFieldMissing {
        parent: &'static str,
        element: &'static str,
    },

    /// The document uses a schema feature this parser does not understand.
    /// Fatal by design: silently misreading financial data is worse than
    /// refusing it.
    #[error("unsupported {what}: `{value}`")]
    UnsupportedSchema {
        what: &'static str,
        value: String,
    },

    /// A foreign-key guid does not name any known entity.
    #[error("{kind} reference `{guid}` does not resolve to a known entity")]
    ReferenceResolution {
        kind: &'static str,
        guid: String,
    },
}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        ParseError::Format(err.to_string())
    }
}

impl ParseError {
    pub(crate) fn format<T: ToString>(msg: T) -> ParseError {
        ParseError::Format(msg.to_string())
    }

    pub(crate) fn missing(parent: &'static str, element: &'static str) -> ParseError {
        ParseError::RequiredFieldMissing { parent, element }
    }

    pub(crate) fn unresolved(kind: &'static str, guid: &str) -> ParseError {
        ParseError::ReferenceResolution {
            kind,
            guid: guid.to_string(),
        }
    }
}
