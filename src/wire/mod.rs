//! The tagged binary wire format.
//!
//! Every encoded value opens with a single tag byte; multi-byte integers
//! and doubles are big-endian, lengths and indices are unsigned LEB128
//! varints. There is no outer framing, header, or checksum — peers must
//! agree on the tag table bit-for-bit.

pub mod decode;
pub mod encode;
pub mod tag;

pub use decode::Decoder;
pub use encode::Encoder;
