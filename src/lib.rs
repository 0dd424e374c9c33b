//! aeroorm - Layered model methods with explicit super dispatch
//!
//! Modules extend model methods by stacking layers; each layer can hand
//! over to the one it overrides through `RecordSet::call_super`.
//!
//! ```ignore
//! use aeroorm::{args, MethodRegistry, MethodResult, RecordSet};
//!
//! fn base(_rs: &RecordSet, price: f64) -> MethodResult<f64> {
//!     Ok(price * 0.9)
//! }
//!
//! fn promotion(rs: &RecordSet, price: f64) -> MethodResult<f64> {
//!     Ok(rs.super_as::<f64>(&args![price])?.unwrap_or(price) - 5.0)
//! }
//!
//! let registry = MethodRegistry::new();
//! registry.declare_method("sale.order", "discount", base)?;
//! registry.declare_method("sale.order", "discount", promotion)?;
//! registry.freeze()?;
//! ```

pub mod config;
pub mod methods;
pub mod observability;
pub mod recordset;

pub use config::{ConfigError, OrmConfig};
pub use methods::{
    LayerHandle, MethodDescriptor, MethodError, MethodKey, MethodRegistry, MethodResult, Module,
    Signature, TypeInfo, Value,
};
pub use recordset::{Environment, MemoryRowSource, Predicate, RecordSet, RowSource};
