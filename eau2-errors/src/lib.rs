//! Shared error types for the eau2 workspace.
//!
//! Every crate that can fail defines its failures in terms of one of the enums here rather than
//! reaching for `anyhow` — that's reserved for binary entry points.

use thiserror::Error;

/// Errors produced while encoding or decoding the text wire format (§6 of the spec: scalars,
/// arrays, columns, schemas, data frames, and control messages).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed control message: {0}")]
    MalformedMessage(String),

    #[error("unknown tag: {0}")]
    UnknownTag(u8),

    #[error("invalid integer value: {0}")]
    InvalidInteger(#[from] std::num::ParseIntError),

    #[error("invalid float value: {0}")]
    InvalidFloat(#[from] std::num::ParseFloatError),

    #[error("invalid boolean value: {0}")]
    InvalidBoolean(String),

    #[error("invalid cell type tag: {0}")]
    InvalidTypeTag(char),

    #[error("schema has the wrong number of parts: expected 3 semicolon-separated parts, got {0}")]
    MalformedSchema(usize),

    #[error("data frame payload is missing the schema/column separator '~'")]
    MissingFrameSeparator,

    #[error("key name must not be empty")]
    EmptyKeyName,

    #[error("key name '{0}' contains a reserved delimiter character")]
    ReservedDelimiterInKeyName(String),

    #[error("string value contains a reserved delimiter character: {0:?}")]
    ReservedDelimiterInValue(String),
}

/// Errors from the transport layer (§4.1).
#[derive(Debug, Error)]
pub enum NetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before the full frame was read (expected {expected} bytes, got {got})")]
    ShortRead { expected: usize, got: usize },

    #[error("frame payload of {0} bytes exceeds the maximum allowed frame size")]
    FrameTooLarge(usize),

    #[error("malformed message: {0}")]
    Codec(#[from] CodecError),
}

/// Errors surfaced by the key-value store (§4.5).
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("remote node {0} rejected the request")]
    Rejected(usize),

    #[error("node id {0} is out of range for a directory of size {1}")]
    UnknownHomeNode(usize, usize),
}

/// Errors from distributed/local column operations (§4.6). The spec calls out out-of-bounds
/// access as "undefined" in the source and recommends a defensive re-implementation return an
/// explicit error; this is that error.
#[derive(Debug, Error)]
pub enum ColumnError {
    #[error("index {index} is out of bounds for a column of length {length}")]
    OutOfBounds { index: usize, length: usize },

    #[error("chunk for index {0} was not found in the store even though it should have been initialized")]
    MissingChunk(usize),

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from the distributed data frame layer (§4.7). The spec recommends a defensive
/// re-implementation reject a type mismatch on row set rather than silently ignore it.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column {0} does not exist in this frame")]
    NoSuchColumn(usize),

    #[error("value type does not match column {column}'s declared type")]
    TypeMismatch { column: usize },

    #[error("new column has length {got}, but the frame already has {expected} rows")]
    LengthMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Column(#[from] ColumnError),
}
