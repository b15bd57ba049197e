//! Decoding: bytes → `Value`.

use std::cell::RefCell;
use std::rc::Rc;

use num_bigint::{BigInt, BigUint, Sign};

use super::tag;
use crate::error::CodecError;
use crate::extension::Extension;
use crate::types::{ElementType, ErrorKind, ErrorValue, RegexValue, Value, ViewValue};
use crate::varint::read_varint;

/// Per-call decoder state: input cursor, referrable table, extension list,
/// and the caller's context.
///
/// Identity-bearing composites are appended to the table as empty shells
/// *before* their children are decoded; back-references inside the children
/// then resolve to the same shell, which is what reconstructs shared
/// sub-structure and cycles.
pub struct Decoder<'a, C> {
    input: &'a [u8],
    pos: usize,
    table: Vec<Value>,
    extensions: &'a [Extension<C>],
    context: &'a mut C,
}

impl<'a, C> Decoder<'a, C> {
    pub fn new(input: &'a [u8], extensions: &'a [Extension<C>], context: &'a mut C) -> Self {
        Self {
            input,
            pos: 0,
            table: Vec::new(),
            extensions,
            context,
        }
    }

    /// Decodes one value graph. The input must be fully consumed; trailing
    /// bytes mean the buffer was not produced by a matching encoder.
    pub fn decode(mut self) -> Result<Value, CodecError> {
        let value = self.decode_value()?;
        let remaining = self.input.len() - self.pos;
        if remaining != 0 {
            return Err(CodecError::corrupt(format!(
                "{remaining} trailing bytes after the value"
            )));
        }
        Ok(value)
    }

    fn decode_value(&mut self) -> Result<Value, CodecError> {
        let t = self.read_u8()?;
        match t {
            tag::NULL => Ok(Value::Null),
            tag::UNDEFINED => Ok(Value::Undefined),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),

            tag::BACKREF => {
                let index = self.read_varint()? as usize;
                self.table.get(index).cloned().ok_or_else(|| {
                    CodecError::corrupt(format!(
                        "back-reference to index {index} but table holds {}",
                        self.table.len()
                    ))
                })
            }

            tag::NUMBER => Ok(Value::Number(self.read_f64()?)),
            tag::DATE => Ok(Value::Date(self.read_f64()?)),

            tag::REGEX => {
                let source = self.read_inline_string()?;
                let flags = self.read_inline_string()?;
                Ok(Value::Regex(RegexValue { source, flags }))
            }

            tag::STRING => {
                let s = self.read_string_payload()?;
                Ok(Value::String(s))
            }

            tag::BIGINT_NEG | tag::BIGINT_POS => self.decode_bigint(t),

            tag::SEQUENCE => {
                let len = self.read_varint()? as usize;
                let cell = Rc::new(RefCell::new(Vec::with_capacity(self.bounded(len))));
                self.table.push(Value::Sequence(Rc::clone(&cell)));
                for _ in 0..len {
                    let item = self.decode_value()?;
                    cell.borrow_mut().push(item);
                }
                Ok(Value::Sequence(cell))
            }

            tag::RECORD => {
                let len = self.read_varint()? as usize;
                let cell = Rc::new(RefCell::new(Vec::with_capacity(self.bounded(len))));
                self.table.push(Value::Record(Rc::clone(&cell)));
                for _ in 0..len {
                    let key = self.read_inline_string()?;
                    let item = self.decode_value()?;
                    cell.borrow_mut().push((key, item));
                }
                Ok(Value::Record(cell))
            }

            tag::SET => {
                let len = self.read_varint()? as usize;
                let cell = Rc::new(RefCell::new(Vec::with_capacity(self.bounded(len))));
                self.table.push(Value::Set(Rc::clone(&cell)));
                for _ in 0..len {
                    let item = self.decode_value()?;
                    cell.borrow_mut().push(item);
                }
                Ok(Value::Set(cell))
            }

            tag::MAPPING => {
                let len = self.read_varint()? as usize;
                let cell = Rc::new(RefCell::new(Vec::with_capacity(self.bounded(len))));
                self.table.push(Value::Mapping(Rc::clone(&cell)));
                for _ in 0..len {
                    let key = self.decode_value()?;
                    let item = self.decode_value()?;
                    cell.borrow_mut().push((key, item));
                }
                Ok(Value::Mapping(cell))
            }

            tag::BUFFER => {
                let len = self.read_varint()? as usize;
                let bytes = self.read_exact(len)?.to_vec();
                let value = Value::buffer(bytes);
                self.table.push(value.clone());
                Ok(value)
            }

            // Family dispatch covers the error and element-view sub-ranges.
            t if t & tag::ERROR_FAMILY != 0 && t & (tag::BUFFER_FAMILY | tag::EXTENSION_FAMILY) == 0 => {
                self.decode_error(t)
            }
            t if t & tag::BUFFER_FAMILY != 0 && t & tag::EXTENSION_FAMILY == 0 => {
                self.decode_view(t)
            }
            t if t & tag::EXTENSION_FAMILY != 0 => self.decode_extension(),

            _ => Err(CodecError::corrupt(format!("unknown tag byte 0x{t:02X}"))),
        }
    }

    fn decode_bigint(&mut self, t: u8) -> Result<Value, CodecError> {
        let chunk_count = self.read_u8()? as usize;
        let mut bytes_le = Vec::with_capacity(chunk_count * 8);
        for _ in 0..chunk_count {
            let chunk = self.read_u64()?;
            bytes_le.extend_from_slice(&chunk.to_le_bytes());
        }
        let magnitude = BigUint::from_bytes_le(&bytes_le);
        let sign = if t == tag::BIGINT_NEG { Sign::Minus } else { Sign::Plus };
        Ok(Value::BigInt(BigInt::from_biguint(sign, magnitude)))
    }

    /// The shell goes into the table right after the kind tag, before
    /// message/stack/cause, so a cycle through `cause` resolves.
    fn decode_error(&mut self, t: u8) -> Result<Value, CodecError> {
        let kind = ErrorKind::from_tag(t)
            .ok_or_else(|| CodecError::corrupt(format!("unknown error tag 0x{t:02X}")))?;
        let cell = Rc::new(RefCell::new(ErrorValue::new(kind, "")));
        self.table.push(Value::Error(Rc::clone(&cell)));

        let message = self.read_inline_string()?;
        let stack = self.read_inline_string()?;
        let cause = match self.decode_value()? {
            Value::Undefined => None,
            value => Some(value),
        };

        {
            let mut error = cell.borrow_mut();
            error.message = message;
            error.stack = stack;
            error.cause = cause;
        }
        Ok(Value::Error(cell))
    }

    fn decode_view(&mut self, t: u8) -> Result<Value, CodecError> {
        let element_type = ElementType::from_tag(t)
            .ok_or_else(|| CodecError::corrupt(format!("unknown view tag 0x{t:02X}")))?;
        let buffer_len = self.read_varint()? as usize;
        let byte_offset = self.read_varint()? as usize;
        let length = self.read_varint()? as usize;

        let window_bytes = length
            .checked_mul(element_type.element_size())
            .and_then(|w| w.checked_add(byte_offset));
        match window_bytes {
            Some(end) if end <= buffer_len => {}
            _ => {
                return Err(CodecError::corrupt(format!(
                    "view window (offset {byte_offset}, length {length}) exceeds its {buffer_len}-byte buffer"
                )));
            }
        }

        let buffer = self.read_exact(buffer_len)?.to_vec();
        let value = Value::view(ViewValue {
            element_type,
            buffer,
            byte_offset,
            length,
        });
        self.table.push(value.clone());
        Ok(value)
    }

    /// The slot is reserved before the reduced payload is decoded so that
    /// referrables inside the payload land at the same indices the encoder
    /// gave them; it is overwritten once the extension rebuilds the value.
    fn decode_extension(&mut self) -> Result<Value, CodecError> {
        let name = self.read_inline_string()?;
        let extensions = self.extensions;
        let ext = extensions
            .iter()
            .find(|ext| ext.name() == name)
            .ok_or(CodecError::IncompatibleCodec(name))?;

        let slot = self.table.len();
        self.table.push(Value::Undefined);
        let reduced = self.decode_value()?;
        let rebuilt = ext.from_reduced(reduced, self.context)?;
        let value = Value::Other(rebuilt);
        self.table[slot] = value.clone();
        Ok(value)
    }

    // -- Cursor primitives --

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| CodecError::corrupt("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.input.len());
        let end = end.ok_or_else(|| {
            CodecError::corrupt(format!(
                "need {len} bytes at offset {} but only {} remain",
                self.pos,
                self.input.len() - self.pos
            ))
        })?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u64(&mut self) -> Result<u64, CodecError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(u64::from_be_bytes(bytes))
    }

    fn read_f64(&mut self) -> Result<f64, CodecError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(f64::from_be_bytes(bytes))
    }

    fn read_varint(&mut self) -> Result<u64, CodecError> {
        read_varint(self.input, &mut self.pos)
    }

    /// Varint length, then that many UTF-8 bytes.
    fn read_string_payload(&mut self) -> Result<String, CodecError> {
        let len = self.read_varint()? as usize;
        let bytes = self.read_exact(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::corrupt(format!("invalid UTF-8 string: {e}")))
    }

    /// A string at a structurally known position: the encoder wrote a full
    /// tagged string, so the cursor advances past the tag byte and reads
    /// the length directly.
    fn read_inline_string(&mut self) -> Result<String, CodecError> {
        self.read_u8()?;
        self.read_string_payload()
    }

    /// Caps a claimed element count for pre-allocation; every element costs
    /// at least one input byte, so a claim beyond the remaining input is a
    /// lie.
    fn bounded(&self, claimed: usize) -> usize {
        claimed.min(self.input.len() - self.pos)
    }
}
