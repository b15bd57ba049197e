//! Encoding: `Value` → bytes.

use bytes::{BufMut, BytesMut};

use super::tag;
use crate::error::CodecError;
use crate::extension::Extension;
use crate::types::{ErrorValue, Value, ViewValue};
use crate::varint::write_varint;

/// Per-call encoder state: output buffer, referrable table, extension list,
/// and the caller's context.
///
/// The referrable table is append-only for the duration of the call and a
/// value is appended *before* its children are encoded, so a cycle back to
/// an enclosing value resolves to a back-reference.
pub struct Encoder<'a, C> {
    buf: BytesMut,
    seen: Vec<*const ()>,
    extensions: &'a [Extension<C>],
    context: &'a mut C,
}

impl<'a, C> Encoder<'a, C> {
    pub fn new(extensions: &'a [Extension<C>], context: &'a mut C) -> Self {
        Self {
            buf: BytesMut::new(),
            seen: Vec::new(),
            extensions,
            context,
        }
    }

    /// Encodes one value graph into a self-contained buffer.
    pub fn encode(mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.encode_value(value)?;
        Ok(self.buf.to_vec())
    }

    fn encode_value(&mut self, value: &Value) -> Result<(), CodecError> {
        // Identity-bearing values go through the referrable table first.
        if let Some(ptr) = value.refer_ptr() {
            if let Some(index) = self.seen.iter().position(|&p| p == ptr) {
                self.buf.put_u8(tag::BACKREF);
                write_varint(&mut self.buf, index as u64);
                return Ok(());
            }
            self.seen.push(ptr);
        }

        match value {
            Value::Null => self.buf.put_u8(tag::NULL),
            Value::Undefined => self.buf.put_u8(tag::UNDEFINED),
            Value::Bool(true) => self.buf.put_u8(tag::TRUE),
            Value::Bool(false) => self.buf.put_u8(tag::FALSE),
            Value::Number(n) => {
                self.buf.put_u8(tag::NUMBER);
                self.buf.put_f64(*n);
            }
            Value::Date(ms) => {
                self.buf.put_u8(tag::DATE);
                self.buf.put_f64(*ms);
            }
            Value::BigInt(i) => self.encode_bigint(i)?,
            Value::String(s) => self.encode_string(s),
            Value::Regex(r) => {
                self.buf.put_u8(tag::REGEX);
                self.encode_string(&r.source);
                self.encode_string(&r.flags);
            }
            Value::Sequence(items) => {
                let items = items.borrow();
                self.buf.put_u8(tag::SEQUENCE);
                write_varint(&mut self.buf, items.len() as u64);
                for item in items.iter() {
                    self.encode_value(item)?;
                }
            }
            Value::Record(entries) => {
                let entries = entries.borrow();
                self.buf.put_u8(tag::RECORD);
                write_varint(&mut self.buf, entries.len() as u64);
                for (key, item) in entries.iter() {
                    self.encode_string(key);
                    self.encode_value(item)?;
                }
            }
            Value::Set(items) => {
                let items = items.borrow();
                self.buf.put_u8(tag::SET);
                write_varint(&mut self.buf, items.len() as u64);
                for item in items.iter() {
                    self.encode_value(item)?;
                }
            }
            Value::Mapping(entries) => {
                let entries = entries.borrow();
                self.buf.put_u8(tag::MAPPING);
                write_varint(&mut self.buf, entries.len() as u64);
                for (key, item) in entries.iter() {
                    self.encode_value(key)?;
                    self.encode_value(item)?;
                }
            }
            Value::Error(e) => self.encode_error(&e.borrow())?,
            Value::Buffer(bytes) => {
                let bytes = bytes.borrow();
                self.buf.put_u8(tag::BUFFER);
                write_varint(&mut self.buf, bytes.len() as u64);
                self.buf.put_slice(&bytes);
            }
            Value::View(view) => self.encode_view(&view.borrow()),
            Value::Other(payload) => {
                let extensions = self.extensions;
                let ext = extensions
                    .iter()
                    .find(|ext| ext.accepts(payload.as_ref()))
                    .ok_or_else(|| CodecError::NotSerializable(value.clone()))?;
                self.buf.put_u8(tag::EXTENSION);
                self.encode_string(ext.name());
                let reduced = ext.to_reduced(payload.as_ref(), self.context)?;
                self.encode_value(&reduced)?;
            }
        }
        Ok(())
    }

    /// Full tagged string: tag, varint byte length, UTF-8 payload.
    fn encode_string(&mut self, s: &str) {
        self.buf.put_u8(tag::STRING);
        write_varint(&mut self.buf, s.len() as u64);
        self.buf.put_slice(s.as_bytes());
    }

    /// Sign tag, one-byte chunk count, then 64-bit magnitude chunks
    /// least-significant first. The input is never mutated; sign and
    /// magnitude are read separately.
    fn encode_bigint(&mut self, value: &num_bigint::BigInt) -> Result<(), CodecError> {
        let chunks: Vec<u64> = value.magnitude().iter_u64_digits().collect();
        if chunks.len() > 255 {
            return Err(CodecError::BigIntTooLarge(value.clone()));
        }

        let sign_tag = match value.sign() {
            num_bigint::Sign::Minus => tag::BIGINT_NEG,
            _ => tag::BIGINT_POS,
        };
        self.buf.put_u8(sign_tag);
        self.buf.put_u8(chunks.len() as u8);
        for chunk in chunks {
            self.buf.put_u64(chunk);
        }
        Ok(())
    }

    fn encode_error(&mut self, error: &ErrorValue) -> Result<(), CodecError> {
        self.buf.put_u8(error.kind.tag());
        self.encode_string(&error.message);
        self.encode_string(&error.stack);
        match &error.cause {
            Some(cause) => self.encode_value(cause)?,
            None => self.buf.put_u8(tag::UNDEFINED),
        }
        Ok(())
    }

    /// The whole underlying buffer travels with the view so the
    /// window-to-buffer relationship survives the round trip.
    fn encode_view(&mut self, view: &ViewValue) {
        self.buf.put_u8(view.element_type.tag());
        write_varint(&mut self.buf, view.buffer.len() as u64);
        write_varint(&mut self.buf, view.byte_offset as u64);
        write_varint(&mut self.buf, view.length as u64);
        self.buf.put_slice(&view.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, ErrorKind};
    use num_bigint::BigInt;

    fn encode(value: &Value) -> Vec<u8> {
        Encoder::new(&[], &mut ()).encode(value).expect("encode failed")
    }

    #[test]
    fn unit_values_are_one_tag_byte() {
        assert_eq!(encode(&Value::Null), [tag::NULL]);
        assert_eq!(encode(&Value::Undefined), [tag::UNDEFINED]);
        assert_eq!(encode(&Value::Bool(true)), [tag::TRUE]);
        assert_eq!(encode(&Value::Bool(false)), [tag::FALSE]);
    }

    #[test]
    fn number_is_tag_plus_big_endian_double() {
        let bytes = encode(&Value::Number(1.5));
        assert_eq!(bytes[0], tag::NUMBER);
        assert_eq!(&bytes[1..], 1.5f64.to_be_bytes());
    }

    #[test]
    fn string_layout() {
        let bytes = encode(&Value::from("hi"));
        assert_eq!(bytes, [tag::STRING, 2, b'h', b'i']);
    }

    #[test]
    fn regex_is_two_tagged_strings() {
        let bytes = encode(&Value::regex("a+", "gi"));
        assert_eq!(
            bytes,
            [tag::REGEX, tag::STRING, 2, b'a', b'+', tag::STRING, 2, b'g', b'i']
        );
    }

    #[test]
    fn bigint_chunks_are_little_significant_first() {
        // 2^64 + 5 = chunks [5, 1]
        let value = (BigInt::from(1u8) << 64u32) + BigInt::from(5u8);
        let bytes = encode(&Value::BigInt(value));

        let mut expected = vec![tag::BIGINT_POS, 2];
        expected.extend_from_slice(&5u64.to_be_bytes());
        expected.extend_from_slice(&1u64.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn negative_bigint_uses_the_negative_tag_without_mutating_input() {
        let value = BigInt::from(-7);
        let bytes = encode(&Value::BigInt(value.clone()));
        assert_eq!(bytes[0], tag::BIGINT_NEG);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[2..], 7u64.to_be_bytes());
        assert_eq!(value, BigInt::from(-7));
    }

    #[test]
    fn zero_bigint_is_positive_with_no_chunks() {
        assert_eq!(encode(&Value::BigInt(BigInt::from(0))), [tag::BIGINT_POS, 0]);
    }

    #[test]
    fn bigint_at_the_chunk_limit_encodes() {
        let value = (BigInt::from(1u8) << (255u32 * 64)) - BigInt::from(1u8);
        let bytes = encode(&Value::BigInt(value));
        assert_eq!(bytes[1], 255);
        assert_eq!(bytes.len(), 2 + 255 * 8);
    }

    #[test]
    fn bigint_over_the_chunk_limit_is_rejected() {
        let value = BigInt::from(1u8) << (255u32 * 64);
        let result = Encoder::new(&[], &mut ()).encode(&Value::BigInt(value));
        assert!(matches!(result, Err(CodecError::BigIntTooLarge(_))));
    }

    #[test]
    fn sequence_layout() {
        let bytes = encode(&Value::sequence(vec![Value::Null, Value::Bool(true)]));
        assert_eq!(bytes, [tag::SEQUENCE, 2, tag::NULL, tag::TRUE]);
    }

    #[test]
    fn record_keys_are_full_tagged_strings() {
        let bytes = encode(&Value::record(vec![("a".into(), Value::Null)]));
        assert_eq!(bytes, [tag::RECORD, 1, tag::STRING, 1, b'a', tag::NULL]);
    }

    #[test]
    fn repeated_referrable_emits_a_back_reference() {
        let shared = Value::sequence(vec![]);
        let outer = Value::sequence(vec![shared.clone(), shared]);
        let bytes = encode(&outer);
        // outer (index 0), shared (index 1), backref to index 1
        assert_eq!(
            bytes,
            [tag::SEQUENCE, 2, tag::SEQUENCE, 0, tag::BACKREF, 1]
        );
    }

    #[test]
    fn cycle_terminates_with_a_back_reference_to_the_parent() {
        let outer = Value::sequence(vec![]);
        if let Value::Sequence(items) = &outer {
            items.borrow_mut().push(outer.clone());
        }
        let bytes = encode(&outer);
        assert_eq!(bytes, [tag::SEQUENCE, 1, tag::BACKREF, 0]);
    }

    #[test]
    fn equal_but_distinct_sequences_are_not_shared() {
        let a = Value::sequence(vec![]);
        let b = Value::sequence(vec![]);
        let bytes = encode(&Value::sequence(vec![a, b]));
        assert_eq!(
            bytes,
            [tag::SEQUENCE, 2, tag::SEQUENCE, 0, tag::SEQUENCE, 0]
        );
    }

    #[test]
    fn error_layout_with_no_cause_ends_in_undefined() {
        let e = Value::error(ErrorValue::new(ErrorKind::Type, "boom"));
        let bytes = encode(&e);
        let mut expected = vec![tag::TYPE_ERROR, tag::STRING, 4];
        expected.extend_from_slice(b"boom");
        expected.extend_from_slice(&[tag::STRING, 0, tag::UNDEFINED]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn buffer_layout() {
        let bytes = encode(&Value::buffer(vec![0xDE, 0xAD]));
        assert_eq!(bytes, [tag::BUFFER, 2, 0xDE, 0xAD]);
    }

    #[test]
    fn view_carries_the_whole_underlying_buffer() {
        let view = Value::view(ViewValue {
            element_type: ElementType::U16,
            buffer: vec![9; 6],
            byte_offset: 2,
            length: 2,
        });
        let bytes = encode(&view);
        assert_eq!(bytes[0], tag::VIEW_U16);
        assert_eq!(&bytes[1..4], [6, 2, 2]); // buffer len, offset, element count
        assert_eq!(&bytes[4..], [9; 6]);
    }

    #[test]
    fn opaque_value_without_an_extension_is_not_serializable() {
        let result = Encoder::new(&[], &mut ()).encode(&Value::other(3u8));
        assert!(matches!(result, Err(CodecError::NotSerializable(_))));
    }
}
