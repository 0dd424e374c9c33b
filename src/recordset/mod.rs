//! Record sets: the calling context of model methods
//!
//! A [`RecordSet`] is bound to one model and a set of row ids. It carries
//! the pending query used to resolve those ids and the stack of method
//! layers currently executing on it, which is what lets a layer reach the
//! one it overrides.
//!
//! # Value semantics
//!
//! - Filtering, id changes and dispatch return new record sets
//! - The receiver is never modified
//! - Record sets are `Send + Sync` and can be shared freely across threads

mod dispatch;
mod environment;
mod query;
mod recordset;
mod rows;

pub use environment::Environment;
pub use query::{Condition, Connector, FilterOp, Predicate, Query, SortDirection, SortSpec, Term};
pub use recordset::RecordSet;
pub use rows::{ConditionFilter, MemoryRowSource, RowSource};
