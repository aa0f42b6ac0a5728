use std::io;

use thiserror::Error;

/// Rejected intent. The editor is left untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("unknown intent: {name}")]
    UnknownIntent { name: String },

    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },

    #[error("missing field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("unknown option for {field}: {value}")]
    UnknownOption { field: String, value: String },

    #[error("field cannot be patched: {field}")]
    UnknownField { field: String },

    #[error("window index {index} out of range (windows={len})")]
    WindowOutOfRange { index: usize, len: usize },

    #[error("section index {index} out of range (sections={len})")]
    SectionOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("project snapshot has no windows")]
    NoWindows,

    #[error("project snapshot reuses id {id}")]
    DuplicateId { id: u64 },

    #[error("project snapshot id {id} leaves no room for new ids (max {max})")]
    IdOutOfRange { id: u64, max: u64 },
}

/// Failure applying a JSON-pointer patch op to a view model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("invalid json pointer path: {path}")]
    InvalidPointer { path: String },

    #[error("invalid escape in json pointer token: {token}")]
    InvalidEscape { token: String },

    #[error("path does not exist: {path}")]
    MissingPath { path: String },

    #[error("invalid array index '{token}' at path {path}")]
    InvalidIndex { token: String, path: String },

    #[error("array index out of bounds '{token}' at path {path}")]
    IndexOutOfBounds { token: String, path: String },

    #[error("cannot address into non-container value at path {path}")]
    NotAContainer { path: String },
}

/// Fatal host failure; ends the session loop.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("outbound writer closed before the session ended")]
    WriterClosed,

    #[error("outbound writer thread panicked")]
    WriterPanicked,
}

pub type HostResult<T> = Result<T, HostError>;
