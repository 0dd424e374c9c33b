//! Layered model methods
//!
//! Modules extend a model method without touching its original definition:
//! every declaration for the same (model, method) pair pushes a new layer,
//! and a layer reaches the one it overrides through
//! [`RecordSet::call_super`](crate::recordset::RecordSet::call_super).
//!
//! # Lifecycle
//!
//! 1. Bootstrap: modules declare layers (single writer)
//! 2. Freeze: the registry becomes read-only
//! 3. Dispatch: any number of threads call methods through record sets
//!
//! # Invariants
//!
//! - All layers of a method share the signature of the first declaration
//! - Layers run most recently declared first; `call_super` walks strictly
//!   toward earlier declarations
//! - Layers are never removed or reordered

mod descriptor;
mod errors;
mod layer;
mod registry;
mod signature;
mod value;

pub use descriptor::{MethodDescriptor, MethodKey};
pub use errors::{MethodError, MethodResult};
pub use layer::{Callable, IntoMethod, Layer, LayerHandle, LayerId};
pub use registry::{MethodRegistry, Module};
pub use signature::Signature;
pub use value::{TypeInfo, Value};
