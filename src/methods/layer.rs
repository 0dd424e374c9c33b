//! Method layers
//!
//! A layer is one implementation of a method, contributed by one module.
//! Layers are created once at declaration time and never change.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::descriptor::MethodKey;
use super::errors::{MethodError, MethodResult};
use super::signature::Signature;
use super::value::{TypeInfo, Value};
use crate::recordset::RecordSet;

/// Uniform invocation interface every layer is erased to
pub type Callable =
    Arc<dyn Fn(&RecordSet, &[Value]) -> MethodResult<Option<Value>> + Send + Sync>;

/// Registry-unique identity of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle returned when a layer is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub(crate) LayerId);

impl LayerHandle {
    pub fn id(&self) -> LayerId {
        self.0
    }
}

/// One registered implementation of a method
pub struct Layer {
    id: LayerId,
    key: MethodKey,
    signature: Signature,
    callable: Callable,
}

impl Layer {
    pub(crate) fn new(
        id: LayerId,
        key: MethodKey,
        signature: Signature,
        callable: Callable,
    ) -> Self {
        Self {
            id,
            key,
            signature,
            callable,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Key of the method this layer belongs to
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invoke the implementation with `rs` as receiver.
    ///
    /// Arguments are matched positionally against the signature; there is
    /// no coercion.
    pub fn invoke(&self, rs: &RecordSet, args: &[Value]) -> MethodResult<Option<Value>> {
        self.signature.check_args(&self.key, args)?;
        (self.callable)(rs, args)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Conversion of a typed Rust function into an erased layer.
///
/// Implemented for `Fn(&RecordSet, A1, .., An) -> MethodResult<R>` with up
/// to six parameters. `R = ()` declares no return value.
pub trait IntoMethod<Marker>: Send + Sync + 'static {
    fn into_method(self) -> (Signature, Callable);
}

fn missing_argument(position: usize, expected: TypeInfo) -> MethodError {
    MethodError::Internal(format!(
        "argument {} of type {} not available after signature check",
        position, expected
    ))
}

fn into_return<R: Any + Send + Sync>(out: R) -> Option<Value> {
    TypeInfo::returning::<R>().map(|_| Value::new(out))
}

macro_rules! impl_into_method {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoMethod<fn(&RecordSet, $($arg,)*) -> R> for F
        where
            F: Fn(&RecordSet, $($arg,)*) -> MethodResult<R> + Send + Sync + 'static,
            R: Any + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_method(self) -> (Signature, Callable) {
                let signature = Signature::new(
                    vec![$(TypeInfo::of::<$arg>(),)*],
                    TypeInfo::returning::<R>(),
                );
                let callable: Callable = Arc::new(
                    move |rs: &RecordSet, args: &[Value]| -> MethodResult<Option<Value>> {
                        let mut position = 0;
                        $(
                            position += 1;
                            let $arg: $arg = args
                                .get(position - 1)
                                .and_then(|value| value.downcast_ref::<$arg>())
                                .cloned()
                                .ok_or_else(|| missing_argument(position, TypeInfo::of::<$arg>()))?;
                        )*
                        let out = (self)(rs, $($arg,)*)?;
                        Ok(into_return(out))
                    },
                );
                (signature, callable)
            }
        }
    };
}

impl_into_method!();
impl_into_method!(A1);
impl_into_method!(A1, A2);
impl_into_method!(A1, A2, A3);
impl_into_method!(A1, A2, A3, A4);
impl_into_method!(A1, A2, A3, A4, A5);
impl_into_method!(A1, A2, A3, A4, A5, A6);

#[cfg(test)]
mod tests {
    use super::*;

    fn signature_of<M, F: IntoMethod<M>>(f: F) -> Signature {
        f.into_method().0
    }

    #[test]
    fn test_signature_from_closure() {
        let sig = signature_of(|_rs: &RecordSet, price: f64| -> MethodResult<f64> { Ok(price) });
        assert_eq!(sig.params, vec![TypeInfo::of::<f64>()]);
        assert_eq!(sig.ret, Some(TypeInfo::of::<f64>()));
        assert!(sig.validate_receiver().is_ok());
    }

    #[test]
    fn test_unit_return_declares_nothing() {
        let sig = signature_of(|_rs: &RecordSet, _name: String, _n: i64| -> MethodResult<()> {
            Ok(())
        });
        assert_eq!(sig.arity(), 2);
        assert!(sig.ret.is_none());
    }

    #[test]
    fn test_closures_with_same_types_share_signature() {
        let a = signature_of(|_rs: &RecordSet, x: i64| -> MethodResult<i64> { Ok(x) });
        let b = signature_of(|_rs: &RecordSet, x: i64| -> MethodResult<i64> { Ok(x + 1) });
        assert_eq!(a, b);
    }
}
