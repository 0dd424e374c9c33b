//! Query description carried by a record set
//!
//! The description is opaque to dispatch: it is only cloned, extended, and
//! handed to the [`RowSource`](super::RowSource) when ids are resolved.

use serde_json::Value;

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// field = value
    Eq(Value),
    /// field != value
    Ne(Value),
    /// field > value
    Gt(Value),
    /// field >= value
    Gte(Value),
    /// field < value
    Lt(Value),
    /// field <= value
    Lte(Value),
    /// field is one of the values
    In(Vec<Value>),
}

impl FilterOp {
    /// Returns the operator as written in conditions
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "=",
            FilterOp::Ne(_) => "!=",
            FilterOp::Gt(_) => ">",
            FilterOp::Gte(_) => ">=",
            FilterOp::Lt(_) => "<",
            FilterOp::Lte(_) => "<=",
            FilterOp::In(_) => "in",
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq(value))
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Ne(value))
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gt(value))
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gte(value))
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lt(value))
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lte(value))
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOp::In(values))
    }
}

/// How a term joins the condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    AndNot,
}

/// One element of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Predicate(Predicate),
    Group(Condition),
}

/// Conjunction of predicates and nested conditions.
///
/// An empty condition matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    terms: Vec<(Connector, Term)>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate that must hold
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.terms.push((Connector::And, Term::Predicate(predicate)));
        self
    }

    /// Adds a predicate that must not hold
    pub fn and_not(mut self, predicate: Predicate) -> Self {
        self.terms.push((Connector::AndNot, Term::Predicate(predicate)));
        self
    }

    /// Adds a nested condition that must hold
    pub fn and_cond(mut self, condition: Condition) -> Self {
        if !condition.is_empty() {
            self.terms.push((Connector::And, Term::Group(condition)));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(Connector, Term)] {
        &self.terms
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field` (ascending) or `-field` (descending)
    pub fn parse(expr: &str) -> Self {
        match expr.trim().strip_prefix('-') {
            Some(field) => Self::desc(field.trim()),
            None => Self::asc(expr.trim()),
        }
    }
}

/// Pending query of a record set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub condition: Condition,
    pub limit: Option<usize>,
    pub offset: usize,
    pub order_by: Vec<SortSpec>,
    pub group_by: Vec<String>,
    pub distinct: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing restricts or orders the rows
    pub fn is_unrestricted(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_building() {
        let cond = Condition::new()
            .and(Predicate::eq("state", json!("draft")))
            .and_not(Predicate::gt("amount", json!(100)));

        assert_eq!(cond.terms().len(), 2);
        assert_eq!(cond.terms()[1].0, Connector::AndNot);
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let cond = Condition::new().and_cond(Condition::new());
        assert!(cond.is_empty());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SortSpec::parse("name"), SortSpec::asc("name"));
        assert_eq!(SortSpec::parse("-date"), SortSpec::desc("date"));
    }

    #[test]
    fn test_op_names() {
        assert_eq!(FilterOp::Gte(json!(1)).op_name(), ">=");
        assert_eq!(FilterOp::In(vec![]).op_name(), "in");
    }

    #[test]
    fn test_unrestricted() {
        assert!(Query::new().is_unrestricted());
        let query = Query {
            limit: Some(5),
            ..Query::default()
        };
        assert!(!query.is_unrestricted());
    }
}
