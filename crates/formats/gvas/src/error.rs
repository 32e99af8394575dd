use thiserror::Error;

use crate::decode::Fault;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("cannot seek to {pos:#x}: outside buffer bounds (length {len:#x})")]
    SeekOutOfBounds { pos: usize, len: usize },

    #[error("string at offset {offset:#x} is not valid UTF-16: {source}")]
    InvalidString {
        offset: usize,
        source: std::string::FromUtf16Error,
    },

    #[error("negative element count {count} at offset {offset:#x}")]
    NegativeCount { offset: usize, count: i32 },

    #[error("unknown text history type {kind} at offset {offset:#x}")]
    UnknownTextHistory { offset: usize, kind: i8 },

    #[error("unknown format argument type {kind} at offset {offset:#x}")]
    UnknownFormatArgument { offset: usize, kind: i8 },

    #[error("{property}: value ended at {actual:#x}, tag declares end at {expected:#x}")]
    SizeMismatch {
        property: String,
        expected: usize,
        actual: usize,
    },

    #[error("struct {struct_name} at offset {offset:#x} is not a property list (likely native-serialized)")]
    ProbeFailed { struct_name: String, offset: usize },

    #[error("{context}: expected {expected} value, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("struct array {property} has no element tag")]
    MissingElementTag { property: String },

    #[error("no native serializer registered for {name}")]
    UnknownStruct { name: String },

    #[error("unknown entry point {name}")]
    UnknownEntryPoint { name: String },

    #[error("registry: {0}")]
    Registry(String),

    #[error("decoding stopped at offset {offset:#x} with {remaining} bytes left over")]
    TrailingData { offset: usize, remaining: usize },

    #[error("aborted on first fault: {0}")]
    FailFast(Box<Fault>),

    #[error("{context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },
}

impl Error {
    /// Whether a property-level decode may resynchronize past this error.
    ///
    /// Configuration errors and fail-fast aborts always propagate.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::FailFast(_)
                | Error::Registry(_)
                | Error::UnknownEntryPoint { .. }
                | Error::TrailingData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
