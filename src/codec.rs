//! Codec construction and the encode/decode entry points.

use crate::error::CodecError;
use crate::extension::{Extension, MAX_EXTENSIONS};
use crate::types::Value;
use crate::wire::{Decoder, Encoder};

/// A codec: the built-in format plus a validated list of extensions.
///
/// The codec itself holds no mutable state; every call allocates a fresh
/// encoder or decoder, so a single codec can serve any number of
/// sequential calls. `C` is the context type threaded to extension
/// callbacks on each call.
pub struct Codec<C = ()> {
    extensions: Vec<Extension<C>>,
}

impl<C> Codec<C> {
    /// Builds a codec with the given extensions. Registration order is
    /// predicate priority. At most [`MAX_EXTENSIONS`] are accepted.
    pub fn with_extensions(extensions: Vec<Extension<C>>) -> Result<Self, CodecError> {
        if extensions.len() > MAX_EXTENSIONS {
            return Err(CodecError::TooManyExtensions(extensions.len()));
        }
        Ok(Self { extensions })
    }

    pub fn extensions(&self) -> &[Extension<C>] {
        &self.extensions
    }

    /// Encodes a value graph into a self-contained buffer, threading
    /// `context` through every extension callback.
    pub fn encode_with(&self, value: &Value, context: &mut C) -> Result<Vec<u8>, CodecError> {
        let bytes = Encoder::new(&self.extensions, context).encode(value)?;
        tracing::trace!(len = bytes.len(), "encoded value graph");
        Ok(bytes)
    }

    /// Decodes a buffer produced by [`Codec::encode_with`] on a codec with
    /// the same extension set. The input must be fully consumed.
    pub fn decode_with(&self, input: &[u8], context: &mut C) -> Result<Value, CodecError> {
        tracing::trace!(len = input.len(), "decoding value graph");
        Decoder::new(input, &self.extensions, context).decode()
    }
}

impl<C: Default> Codec<C> {
    /// [`Codec::encode_with`] with a fresh default context per call.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.encode_with(value, &mut C::default())
    }

    /// [`Codec::decode_with`] with a fresh default context per call.
    pub fn decode(&self, input: &[u8]) -> Result<Value, CodecError> {
        self.decode_with(input, &mut C::default())
    }
}

impl Default for Codec<()> {
    fn default() -> Self {
        Self { extensions: Vec::new() }
    }
}

/// Encodes a value graph with the extension-free codec.
pub fn encode(value: &Value) -> Result<Vec<u8>, CodecError> {
    Codec::default().encode(value)
}

/// Decodes a buffer produced by an extension-free encoder.
pub fn decode(input: &[u8]) -> Result<Value, CodecError> {
    Codec::default().decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn free_functions_round_trip() {
        let value = Value::record(vec![("n".into(), Value::Number(7.0))]);
        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn over_the_extension_limit_is_rejected() {
        let extensions: Vec<Extension> = (0..=MAX_EXTENSIONS)
            .map(|i| {
                Extension::for_type::<u8, _, _>(
                    format!("ext-{i}"),
                    |v, _| Ok(Value::Number(f64::from(*v))),
                    |_, _| Ok(0u8),
                )
                .unwrap()
            })
            .collect();
        let result = Codec::with_extensions(extensions);
        assert!(matches!(result, Err(CodecError::TooManyExtensions(n)) if n == MAX_EXTENSIONS + 1));
    }

    #[test]
    fn at_the_extension_limit_is_accepted() {
        let extensions: Vec<Extension> = (0..MAX_EXTENSIONS)
            .map(|i| {
                Extension::for_type::<u8, _, _>(
                    format!("ext-{i}"),
                    |v, _| Ok(Value::Number(f64::from(*v))),
                    |_, _| Ok(0u8),
                )
                .unwrap()
            })
            .collect();
        assert!(Codec::with_extensions(extensions).is_ok());
    }

    #[test]
    fn registration_order_is_predicate_priority() {
        // Both extensions accept u32; the first registered must win.
        let first = Extension::<()>::new(
            "first",
            |v| v.is::<u32>(),
            |_, _| Ok(Value::Null),
            |_, _| Ok(Rc::new(1u32) as Rc<dyn std::any::Any>),
        )
        .unwrap();
        let second = Extension::<()>::new(
            "second",
            |v| v.is::<u32>(),
            |_, _| Ok(Value::Null),
            |_, _| Ok(Rc::new(2u32) as Rc<dyn std::any::Any>),
        )
        .unwrap();

        let codec = Codec::with_extensions(vec![first, second]).unwrap();
        let bytes = codec.encode(&Value::other(9u32)).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(*decoded.downcast_other::<u32>().unwrap(), 1);
    }

    #[test]
    fn context_is_threaded_through_callbacks() {
        #[derive(Default)]
        struct Audit {
            reduced: Vec<String>,
            restored: Vec<String>,
        }

        let ext = Extension::<Audit>::for_type::<u32, _, _>(
            "counter",
            |v, ctx: &mut Audit| {
                ctx.reduced.push(format!("u32:{v}"));
                Ok(Value::Number(f64::from(*v)))
            },
            |reduced, ctx: &mut Audit| {
                let n = reduced
                    .as_f64()
                    .ok_or_else(|| CodecError::Extension("expected a number".into()))?;
                ctx.restored.push(format!("u32:{n}"));
                Ok(n as u32)
            },
        )
        .unwrap();

        let codec = Codec::with_extensions(vec![ext]).unwrap();

        let mut encode_ctx = Audit::default();
        let bytes = codec
            .encode_with(&Value::other(5u32), &mut encode_ctx)
            .unwrap();
        assert_eq!(encode_ctx.reduced, ["u32:5"]);

        let mut decode_ctx = Audit::default();
        let decoded = codec.decode_with(&bytes, &mut decode_ctx).unwrap();
        assert_eq!(decode_ctx.restored, ["u32:5"]);
        assert_eq!(*decoded.downcast_other::<u32>().unwrap(), 5);
    }

    #[test]
    fn extension_failures_propagate() {
        let ext = Extension::<()>::for_type::<u8, _, _>(
            "failing",
            |_, _| Err(CodecError::Extension("refused".into())),
            |_, _| Ok(0u8),
        )
        .unwrap();
        let codec = Codec::with_extensions(vec![ext]).unwrap();
        let result = codec.encode(&Value::other(1u8));
        assert!(matches!(result, Err(CodecError::Extension(m)) if m == "refused"));
    }
}
