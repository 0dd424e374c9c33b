//! Row identifier resolution
//!
//! Resolving a query to ids belongs to the persistence layer; record sets
//! only see the [`RowSource`] trait. [`MemoryRowSource`] keeps JSON rows in
//! memory and evaluates queries strictly: no type coercion, missing or null
//! fields never match.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use super::query::{Condition, Connector, FilterOp, Predicate, Query, SortDirection, SortSpec, Term};
use crate::methods::{MethodError, MethodResult};

/// Resolves the pending query of a record set to row ids
pub trait RowSource: Send + Sync {
    fn search(&self, model: &str, query: &Query) -> MethodResult<Vec<i64>>;
}

/// In-memory rows, one JSON object per id
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    tables: RwLock<HashMap<String, BTreeMap<i64, Value>>>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row `id` of `model`
    pub fn insert(&self, model: &str, id: i64, row: Value) -> MethodResult<()> {
        if !row.is_object() {
            return Err(MethodError::storage(format!(
                "row {} of `{}` must be a JSON object",
                id, model
            )));
        }
        let mut tables = self
            .tables
            .write()
            .map_err(|_| MethodError::Internal("Lock poisoned".into()))?;
        tables.entry(model.to_string()).or_default().insert(id, row);
        Ok(())
    }

    /// Number of rows stored for `model`
    pub fn len(&self, model: &str) -> usize {
        self.tables
            .read()
            .map(|t| t.get(model).map(|rows| rows.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, model: &str) -> bool {
        self.len(model) == 0
    }
}

impl RowSource for MemoryRowSource {
    fn search(&self, model: &str, query: &Query) -> MethodResult<Vec<i64>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MethodError::Internal("Lock poisoned".into()))?;
        let rows = match tables.get(model) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        // BTreeMap iteration yields ascending ids, which the stable sort keeps for ties.
        let mut matched: Vec<(i64, &Value)> = rows
            .iter()
            .filter(|(_, row)| ConditionFilter::matches(row, &query.condition))
            .map(|(id, row)| (*id, row))
            .collect();

        if !query.order_by.is_empty() {
            matched.sort_by(|(_, a), (_, b)| RowSorter::compare(a, b, &query.order_by));
        }

        let mut ids: Vec<i64> = matched.into_iter().map(|(id, _)| id).collect();
        if query.distinct {
            let mut seen = std::collections::HashSet::new();
            ids.retain(|id| seen.insert(*id));
        }

        let ids = ids
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(ids)
    }
}

/// Evaluates conditions against rows
pub struct ConditionFilter;

impl ConditionFilter {
    /// Checks if a row satisfies every term of the condition
    pub fn matches(row: &Value, condition: &Condition) -> bool {
        condition.terms().iter().all(|(connector, term)| {
            let hit = match term {
                Term::Predicate(predicate) => Self::matches_predicate(row, predicate),
                Term::Group(group) => Self::matches(row, group),
            };
            match connector {
                Connector::And => hit,
                Connector::AndNot => !hit,
            }
        })
    }

    fn matches_predicate(row: &Value, predicate: &Predicate) -> bool {
        let field_value = match row.get(&predicate.field) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match &predicate.op {
            FilterOp::Eq(expected) => field_value == expected,
            FilterOp::Ne(expected) => field_value != expected,
            FilterOp::Gt(bound) => Self::compare(field_value, bound) == Some(Ordering::Greater),
            FilterOp::Gte(bound) => matches!(
                Self::compare(field_value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(bound) => Self::compare(field_value, bound) == Some(Ordering::Less),
            FilterOp::Lte(bound) => matches!(
                Self::compare(field_value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In(values) => values.iter().any(|v| v == field_value),
        }
    }

    /// Ordering between two numbers or two strings, `None` otherwise
    fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
        match (actual, bound) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                    return Some(ai.cmp(&bi));
                }
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Orders rows by a list of sort specifications
struct RowSorter;

impl RowSorter {
    fn compare(a: &Value, b: &Value, specs: &[SortSpec]) -> Ordering {
        for spec in specs {
            let ordering = Self::compare_values(a.get(&spec.field), b.get(&spec.field));
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Missing < null < bool < number < string; arrays and objects tie
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let (a, b) = match (a, b) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => (a, b),
        };

        let type_order = |v: &Value| -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Object(_) => 5,
            }
        };
        let (a_type, b_type) = (type_order(a), type_order(b));
        if a_type != b_type {
            return a_type.cmp(&b_type);
        }

        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }
}
