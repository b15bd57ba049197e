//! Error types for encoding and decoding.

use num_bigint::BigInt;

use crate::extension::MAX_EXTENSIONS;
use crate::types::Value;

/// Errors that can occur while building a codec or running an
/// encode/decode call.
///
/// All errors abort the current call; no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An opaque value was encountered that no registered extension accepts.
    #[error("value is not serializable: {0}")]
    NotSerializable(Value),

    /// A big integer's magnitude exceeds 255 64-bit chunks.
    #[error("big integer magnitude exceeds 255 64-bit chunks: {0}")]
    BigIntTooLarge(BigInt),

    /// The input names an extension that is not registered in this codec.
    #[error("no extension registered under name {0:?}")]
    IncompatibleCodec(String),

    /// The input is malformed: truncated, an unknown tag byte, a payload
    /// length past the end of the buffer, an out-of-range back-reference,
    /// or invalid UTF-8.
    #[error("corrupt input: {0}")]
    CorruptInput(String),

    /// More extensions were supplied at construction than the codec supports.
    #[error("too many extensions: {0} (limit {MAX_EXTENSIONS})")]
    TooManyExtensions(usize),

    /// An extension was declared with an empty name.
    #[error("extension name must be non-empty")]
    EmptyExtensionName,

    /// A user-supplied extension callback failed.
    #[error("extension error: {0}")]
    Extension(String),
}

impl CodecError {
    /// Shorthand for a [`CodecError::CorruptInput`] with a formatted detail.
    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        Self::CorruptInput(detail.into())
    }
}
