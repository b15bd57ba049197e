//! User-pluggable value variants.
//!
//! An extension teaches the codec to carry one additional kind of host
//! value: a predicate recognizes it, `to_reduced` lowers it to a value the
//! built-in format can express, and `from_reduced` rebuilds it on the other
//! side. The reduced value may itself contain anything the codec handles,
//! including other extension values.

use std::any::Any;
use std::rc::Rc;

use crate::error::CodecError;
use crate::types::Value;

/// Hard limit on the number of extensions a single codec may carry.
pub const MAX_EXTENSIONS: usize = 128;

type AcceptsFn = Box<dyn Fn(&dyn Any) -> bool>;
type ToReducedFn<C> = Box<dyn Fn(&dyn Any, &mut C) -> Result<Value, CodecError>>;
type FromReducedFn<C> = Box<dyn Fn(Value, &mut C) -> Result<Rc<dyn Any>, CodecError>>;

/// One pluggable value variant.
///
/// The context `C` is an opaque per-call value the codec threads through
/// every transformer; extensions should treat it as read/append-only.
/// Registration order determines predicate priority: the first accepting
/// extension wins.
pub struct Extension<C = ()> {
    name: String,
    accepts: AcceptsFn,
    to_reduced: ToReducedFn<C>,
    from_reduced: FromReducedFn<C>,
}

impl<C> Extension<C> {
    /// Builds an extension from raw parts. The name must be non-empty;
    /// ASCII is recommended since the name travels on the wire.
    pub fn new(
        name: impl Into<String>,
        accepts: impl Fn(&dyn Any) -> bool + 'static,
        to_reduced: impl Fn(&dyn Any, &mut C) -> Result<Value, CodecError> + 'static,
        from_reduced: impl Fn(Value, &mut C) -> Result<Rc<dyn Any>, CodecError> + 'static,
    ) -> Result<Self, CodecError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CodecError::EmptyExtensionName);
        }
        Ok(Self {
            name,
            accepts: Box::new(accepts),
            to_reduced: Box::new(to_reduced),
            from_reduced: Box::new(from_reduced),
        })
    }

    /// Builds an extension for one concrete host type. The predicate is the
    /// downcast check, and the transformers work on `T` directly.
    pub fn for_type<T, R, F>(
        name: impl Into<String>,
        to_reduced: R,
        from_reduced: F,
    ) -> Result<Self, CodecError>
    where
        T: Any,
        R: Fn(&T, &mut C) -> Result<Value, CodecError> + 'static,
        F: Fn(Value, &mut C) -> Result<T, CodecError> + 'static,
    {
        Self::new(
            name,
            |value| value.is::<T>(),
            move |value, context| {
                let typed = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| CodecError::Extension("accepted value of the wrong type".into()))?;
                to_reduced(typed, context)
            },
            move |reduced, context| {
                let rebuilt = from_reduced(reduced, context)?;
                Ok(Rc::new(rebuilt) as Rc<dyn Any>)
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn accepts(&self, value: &dyn Any) -> bool {
        (self.accepts)(value)
    }

    pub(crate) fn to_reduced(&self, value: &dyn Any, context: &mut C) -> Result<Value, CodecError> {
        (self.to_reduced)(value, context)
    }

    pub(crate) fn from_reduced(
        &self,
        reduced: Value,
        context: &mut C,
    ) -> Result<Rc<dyn Any>, CodecError> {
        (self.from_reduced)(reduced, context)
    }
}

impl<C> std::fmt::Debug for Extension<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension").field("name", &self.name).finish_non_exhaustive()
    }
}
