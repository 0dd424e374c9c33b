//! Record set identity
//!
//! A record set is a value: every operation that changes its query, ids,
//! or call stack returns a new record set and leaves the receiver as it
//! was. The query is shared between copies until one of them changes it.

use std::fmt;
use std::sync::Arc;

use super::environment::Environment;
use super::query::{Condition, Predicate, Query, SortSpec};
use crate::methods::{Layer, MethodError, MethodResult};

/// Handle onto zero or more rows of one model
#[derive(Clone)]
pub struct RecordSet {
    pub(super) env: Arc<Environment>,
    pub(super) model: Arc<str>,
    pub(super) query: Arc<Query>,
    pub(super) ids: Vec<i64>,
    /// Layers being executed on this record set, innermost last
    pub(super) call_stack: Vec<Arc<Layer>>,
}

impl RecordSet {
    /// Empty record set on `model`
    pub fn new(env: Arc<Environment>, model: &str) -> Self {
        Self {
            env,
            model: Arc::from(model),
            query: Arc::new(Query::new()),
            ids: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Resolved ids; empty until searched or browsed
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Number of dispatch frames active on this record set
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Layers being executed, outermost first
    pub fn call_stack(&self) -> &[Arc<Layer>] {
        &self.call_stack
    }

    /// Copy of this record set pinned to `ids`
    pub fn with_ids(&self, ids: Vec<i64>) -> RecordSet {
        let mut rs = self.clone();
        rs.ids = ids;
        rs
    }

    /// Record set on the given ids of this model
    pub fn browse(&self, ids: &[i64]) -> RecordSet {
        self.with_ids(ids.to_vec())
    }

    /// Resolve ids from the pending query, unless already resolved
    pub fn search(&self) -> MethodResult<RecordSet> {
        if self.ids.is_empty() {
            return self.force_search();
        }
        Ok(self.clone())
    }

    /// Resolve ids from the pending query, discarding any resolved ids
    pub fn force_search(&self) -> MethodResult<RecordSet> {
        let ids = self.env.rows().search(&self.model, &self.query)?;
        Ok(self.with_ids(ids))
    }

    /// One singleton record set per resolved id
    pub fn records(&self) -> MethodResult<Vec<RecordSet>> {
        let rs = self.search()?;
        Ok(rs.ids.iter().map(|id| rs.with_ids(vec![*id])).collect())
    }

    /// Fails unless exactly one id is resolved
    pub fn ensure_one(&self) -> MethodResult<()> {
        let rs = self.search()?;
        if rs.ids.len() != 1 {
            return Err(MethodError::NotASingleton(rs.to_string()));
        }
        Ok(())
    }

    fn with_query(&self, update: impl FnOnce(&mut Query)) -> RecordSet {
        let mut rs = self.clone();
        update(Arc::make_mut(&mut rs.query));
        rs
    }

    /// Add a filter condition
    pub fn filter(&self, predicate: Predicate) -> RecordSet {
        self.with_query(|q| q.condition = std::mem::take(&mut q.condition).and(predicate))
    }

    /// Add a negated filter condition
    pub fn exclude(&self, predicate: Predicate) -> RecordSet {
        self.with_query(|q| q.condition = std::mem::take(&mut q.condition).and_not(predicate))
    }

    /// Add a nested condition
    pub fn set_condition(&self, condition: Condition) -> RecordSet {
        self.with_query(|q| q.condition = std::mem::take(&mut q.condition).and_cond(condition))
    }

    pub fn limit(&self, limit: usize) -> RecordSet {
        self.with_query(|q| q.limit = Some(limit))
    }

    /// Set limit and offset at once
    pub fn limit_offset(&self, limit: usize, offset: usize) -> RecordSet {
        self.with_query(|q| {
            q.limit = Some(limit);
            q.offset = offset;
        })
    }

    pub fn offset(&self, offset: usize) -> RecordSet {
        self.with_query(|q| q.offset = offset)
    }

    /// Append ORDER BY expressions; `-field` sorts descending
    pub fn order_by(&self, exprs: &[&str]) -> RecordSet {
        self.with_query(|q| q.order_by.extend(exprs.iter().map(|e| SortSpec::parse(e))))
    }

    /// Append GROUP BY expressions
    pub fn group_by(&self, exprs: &[&str]) -> RecordSet {
        self.with_query(|q| q.group_by.extend(exprs.iter().map(|e| e.to_string())))
    }

    pub fn distinct(&self) -> RecordSet {
        self.with_query(|q| q.distinct = true)
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.ids.iter().map(|id| id.to_string()).collect();
        write!(f, "{}({})", self.model, ids.join(","))
    }
}

impl fmt::Debug for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSet")
            .field("model", &self.model)
            .field("ids", &self.ids)
            .field("query", &self.query)
            .field("call_depth", &self.call_stack.len())
            .finish()
    }
}
