//! Error types for the protocol layer.
//!
//! [`FrameError`] covers the outer type-length-payload frame.
//! [`ProtocolError`] adds what can go wrong when a well-formed frame is
//! interpreted as a specific message.

use crate::Tag;

/// The outer frame could not be split into header and payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the fixed header (tag + length).
    #[error("frame is shorter than its header")]
    Empty,

    /// The header promises more payload than the buffer holds.
    #[error("frame truncated: header declares {declared} payload bytes, {available} present")]
    Truncated { declared: usize, available: usize },

    /// Bytes left over after the declared payload.
    #[error("frame has {extra} trailing bytes after its payload")]
    TrailingBytes { extra: usize },
}

/// A frame could not be turned into a typed message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The outer frame was malformed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The tag is not one this side of the connection accepts.
    #[error("unknown message tag {0:#04x}")]
    UnknownTag(u8),

    /// The payload size does not match what the tag requires.
    #[error("{tag} payload must be {expected} bytes, got {actual}")]
    LengthMismatch {
        tag: Tag,
        expected: usize,
        actual: usize,
    },

    /// A string field is not valid UTF-8.
    #[error("string field is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),
}
