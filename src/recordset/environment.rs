//! Execution environment shared by record sets
//!
//! Holds the frozen method registry, the row source, and the user and
//! context the record sets act on behalf of.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::rows::RowSource;
use crate::methods::MethodRegistry;

/// Environment every record set derived from the same root shares
#[derive(Clone)]
pub struct Environment {
    registry: Arc<MethodRegistry>,
    rows: Arc<dyn RowSource>,
    uid: i64,
    context: Map<String, Value>,
    session_id: Uuid,
}

impl Environment {
    /// Create an environment for the superuser with an empty context
    pub fn new(registry: Arc<MethodRegistry>, rows: Arc<dyn RowSource>) -> Self {
        Self {
            registry,
            rows,
            uid: 1,
            context: Map::new(),
            session_id: Uuid::new_v4(),
        }
    }

    /// Set the acting user
    pub fn with_uid(mut self, uid: i64) -> Self {
        self.uid = uid;
        self
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    pub fn rows(&self) -> &Arc<dyn RowSource> {
        &self.rows
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Identifies this environment in logs
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("uid", &self.uid)
            .field("context", &self.context)
            .field("session_id", &self.session_id)
            .finish()
    }
}
