//! Method signatures and their validation
//!
//! A signature is captured once when a layer is declared. All later layers
//! of the same method must match it exactly, so argument types are checked
//! against it at call time instead of against each layer.

use std::fmt;

use super::errors::{MethodError, MethodResult};
use super::value::{TypeInfo, Value};
use crate::recordset::RecordSet;

/// Declared type of a method implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// First parameter; must be the calling context
    pub receiver: TypeInfo,
    /// Remaining positional parameters
    pub params: Vec<TypeInfo>,
    /// Declared return type, `None` for methods returning nothing
    pub ret: Option<TypeInfo>,
}

impl Signature {
    /// Signature of a method taking a `RecordSet` receiver
    pub fn new(params: Vec<TypeInfo>, ret: Option<TypeInfo>) -> Self {
        Self::with_receiver(TypeInfo::of::<RecordSet>(), params, ret)
    }

    /// Signature with an explicit receiver type
    pub fn with_receiver(receiver: TypeInfo, params: Vec<TypeInfo>, ret: Option<TypeInfo>) -> Self {
        Self {
            receiver,
            params,
            ret,
        }
    }

    /// Number of parameters after the receiver
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Fails unless the first parameter is the calling context
    pub fn validate_receiver(&self) -> MethodResult<()> {
        if self.receiver != TypeInfo::of::<RecordSet>() {
            return Err(MethodError::InvalidImplementation(format!(
                "function must have `RecordSet` as first argument to be used as method, got `{}`",
                self
            )));
        }
        Ok(())
    }

    /// Fails unless `other` is identical to this signature
    pub fn ensure_matches(&self, other: &Signature) -> MethodResult<()> {
        if self != other {
            return Err(MethodError::SignatureMismatch {
                expected: self.to_string(),
                received: other.to_string(),
            });
        }
        Ok(())
    }

    /// Checks positional arguments against the declared parameters.
    ///
    /// Excess arguments are ignored.
    pub fn check_args(&self, method: impl fmt::Display, args: &[Value]) -> MethodResult<()> {
        if args.len() < self.params.len() {
            return Err(MethodError::ArityError {
                method: method.to_string(),
                expected: self.params.len(),
                got: args.len(),
            });
        }
        for (position, (expected, arg)) in self.params.iter().zip(args).enumerate() {
            if arg.type_info() != *expected {
                return Err(MethodError::ArgumentTypeMismatch {
                    method: method.to_string(),
                    position: position + 1,
                    expected: expected.to_string(),
                    found: arg.type_info().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}", self.receiver)?;
        for param in &self.params {
            write!(f, ", {}", param)?;
        }
        write!(f, ")")?;
        if let Some(ret) = &self.ret {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}
