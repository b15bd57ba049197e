//! Value types carried by the codec.

mod value;

pub use value::{ElementType, ErrorKind, ErrorValue, RegexValue, Value, ViewValue};
