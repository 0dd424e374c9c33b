//! Type-erased values passed through method dispatch
//!
//! Layers of the same method exchange arguments and results as [`Value`]s.
//! The concrete type is recovered by downcasting; the recorded type name is
//! only used for diagnostics.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use super::errors::{MethodError, MethodResult};

/// Runtime identity of a Rust type
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Type information for `T`
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type information for a return type, `None` for `()`
    pub fn returning<T: Any>() -> Option<Self> {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            None
        } else {
            Some(Self::of::<T>())
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path, e.g. `alloc::string::String`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with every module path removed, e.g. `Vec<String>` or
    /// `(i64, String)`
    pub fn short_name(&self) -> String {
        let mut short = String::with_capacity(self.name.len());
        let mut start = 0;
        for (pos, c) in self.name.char_indices() {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                continue;
            }
            short.push_str(last_segment(&self.name[start..pos]));
            short.push(c);
            start = pos + c.len_utf8();
        }
        short.push_str(last_segment(&self.name[start..]));
        short
    }
}

/// `alloc::string::String` -> `String`
fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// A cheaply clonable, type-erased argument or return value
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
}

impl Value {
    /// Wrap a concrete value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_info: TypeInfo::of::<T>(),
        }
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Returns true if the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the wrapped value out as `T`
    pub fn cloned<T: Any + Clone>(&self) -> MethodResult<T> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| MethodError::ReturnTypeMismatch {
                expected: TypeInfo::of::<T>().to_string(),
                found: self.type_info.to_string(),
            })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_info)
    }
}

/// Build an argument list for `RecordSet::call` and `RecordSet::call_super`
///
/// ```ignore
/// let total = rs.call("discount", &args![100.0_f64])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::methods::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::methods::Value::new($arg)),+]
    };
}
