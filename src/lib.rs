//! GraphPack — a self-describing binary codec for structured value graphs.
//!
//! GraphPack converts an in-memory value graph — primitives, containers,
//! errors, byte buffers, typed views — into a compact byte sequence and
//! reconstructs an equivalent graph on the other side. Unlike textual
//! formats it preserves types (numbers vs. big integers, dates, regular
//! expressions, typed byte views) and shared sub-structure: two references
//! to the same object stay the same object after a round trip, and cyclic
//! graphs encode and decode in bounded time.
//!
//! Both peers must run the same codec version with the same extension set;
//! there is no cross-version compatibility layer.
//!
//! # Architecture
//!
//! - **`wire`** — The tagged wire format: tag table, recursive encoder and
//!   decoder, referrable table for sharing and cycles
//! - **`varint`** — Unsigned LEB128 lengths and indices
//! - **`types`** — The value universe ([`Value`] and its satellites)
//! - **`extension`** — User-pluggable value variants with per-call context
//! - **`codec`** — [`Codec`] construction and the [`encode`]/[`decode`]
//!   entry points
//!
//! # Example
//!
//! ```
//! use graphpack::{decode, encode, Value};
//!
//! let shared = Value::sequence(vec![Value::Number(1.0)]);
//! let graph = Value::record(vec![
//!     ("left".into(), shared.clone()),
//!     ("right".into(), shared),
//! ]);
//!
//! let bytes = encode(&graph)?;
//! let decoded = decode(&bytes)?;
//! assert_eq!(decoded, graph);
//! # Ok::<(), graphpack::CodecError>(())
//! ```

pub mod codec;
pub mod error;
pub mod extension;
pub mod types;
pub mod varint;
pub mod wire;

pub use codec::{decode, encode, Codec};
pub use error::CodecError;
pub use extension::{Extension, MAX_EXTENSIONS};
pub use types::{ElementType, ErrorKind, ErrorValue, RegexValue, Value, ViewValue};
