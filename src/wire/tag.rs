//! Wire tag constants.
//!
//! Every encoded value opens with one tag byte. Tags are partitioned into
//! high-bit bands that double as family masks, so the decoder can range-test
//! "any error" or "any buffer/view" with a single bit.

use crate::types::{ElementType, ErrorKind};

// Unit / scalar / container band
pub const NULL: u8 = 0x01;
pub const UNDEFINED: u8 = 0x02;
pub const TRUE: u8 = 0x03;
pub const FALSE: u8 = 0x04;
pub const BACKREF: u8 = 0x05;
pub const NUMBER: u8 = 0x06;
pub const DATE: u8 = 0x07;
pub const REGEX: u8 = 0x08;
pub const STRING: u8 = 0x09;
pub const BIGINT_NEG: u8 = 0x0A;
pub const BIGINT_POS: u8 = 0x0B;
pub const SEQUENCE: u8 = 0x0C;
pub const RECORD: u8 = 0x0D;
pub const SET: u8 = 0x0E;
pub const MAPPING: u8 = 0x0F;

// Error band (0x20 bit set)
pub const ERROR: u8 = 0x20;
pub const EVAL_ERROR: u8 = 0x21;
pub const RANGE_ERROR: u8 = 0x22;
pub const REFERENCE_ERROR: u8 = 0x23;
pub const SYNTAX_ERROR: u8 = 0x24;
pub const TYPE_ERROR: u8 = 0x25;
pub const URI_ERROR: u8 = 0x26;

// Buffer band (0x40 bit set)
pub const BUFFER: u8 = 0x40;
pub const VIEW_BYTES: u8 = 0x41;
pub const VIEW_I8: u8 = 0x42;
pub const VIEW_U8: u8 = 0x43;
pub const VIEW_U8_CLAMPED: u8 = 0x44;
pub const VIEW_I16: u8 = 0x45;
pub const VIEW_U16: u8 = 0x46;
pub const VIEW_I32: u8 = 0x47;
pub const VIEW_U32: u8 = 0x48;
pub const VIEW_F32: u8 = 0x49;
pub const VIEW_F64: u8 = 0x4A;
pub const VIEW_I64: u8 = 0x4B;
pub const VIEW_U64: u8 = 0x4C;

// Extension band (0x80 bit set)
pub const EXTENSION: u8 = 0x80;

// Family masks for band tests.
pub const ERROR_FAMILY: u8 = 0x20;
pub const BUFFER_FAMILY: u8 = 0x40;
pub const EXTENSION_FAMILY: u8 = 0x80;

impl ErrorKind {
    /// Wire tag for this error kind.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Error => ERROR,
            Self::Eval => EVAL_ERROR,
            Self::Range => RANGE_ERROR,
            Self::Reference => REFERENCE_ERROR,
            Self::Syntax => SYNTAX_ERROR,
            Self::Type => TYPE_ERROR,
            Self::Uri => URI_ERROR,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            ERROR => Some(Self::Error),
            EVAL_ERROR => Some(Self::Eval),
            RANGE_ERROR => Some(Self::Range),
            REFERENCE_ERROR => Some(Self::Reference),
            SYNTAX_ERROR => Some(Self::Syntax),
            TYPE_ERROR => Some(Self::Type),
            URI_ERROR => Some(Self::Uri),
            _ => None,
        }
    }
}

impl ElementType {
    /// Wire tag for a view with this element type.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Bytes => VIEW_BYTES,
            Self::I8 => VIEW_I8,
            Self::U8 => VIEW_U8,
            Self::U8Clamped => VIEW_U8_CLAMPED,
            Self::I16 => VIEW_I16,
            Self::U16 => VIEW_U16,
            Self::I32 => VIEW_I32,
            Self::U32 => VIEW_U32,
            Self::F32 => VIEW_F32,
            Self::F64 => VIEW_F64,
            Self::I64 => VIEW_I64,
            Self::U64 => VIEW_U64,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            VIEW_BYTES => Some(Self::Bytes),
            VIEW_I8 => Some(Self::I8),
            VIEW_U8 => Some(Self::U8),
            VIEW_U8_CLAMPED => Some(Self::U8Clamped),
            VIEW_I16 => Some(Self::I16),
            VIEW_U16 => Some(Self::U16),
            VIEW_I32 => Some(Self::I32),
            VIEW_U32 => Some(Self::U32),
            VIEW_F32 => Some(Self::F32),
            VIEW_F64 => Some(Self::F64),
            VIEW_I64 => Some(Self::I64),
            VIEW_U64 => Some(Self::U64),
            _ => None,
        }
    }
}
