//! Record Set Identity Tests
//!
//! Tests for record set value semantics:
//! - Query builders return new record sets and leave the receiver alone
//! - records() yields singletons that dispatch independently
//! - ensure_one accepts exactly one resolved id

use std::sync::Arc;

use aeroorm::recordset::{Condition, SortSpec};
use aeroorm::{
    args, Environment, MemoryRowSource, MethodError, MethodRegistry, MethodResult, Predicate,
    RecordSet,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn partner_rows() -> MemoryRowSource {
    let rows = MemoryRowSource::new();
    rows.insert("res.partner", 5, json!({ "name": "Alice", "credit": 120 })).unwrap();
    rows.insert("res.partner", 7, json!({ "name": "Bob", "credit": 40 })).unwrap();
    rows.insert("res.partner", 9, json!({ "name": "Carol", "credit": 300 })).unwrap();
    rows
}

fn partners() -> RecordSet {
    let registry = MethodRegistry::new();
    registry
        .declare_method("res.partner", "label", |rs: &RecordSet| -> MethodResult<String> {
            rs.ensure_one()?;
            Ok(format!("partner #{}", rs.ids()[0]))
        })
        .unwrap();
    registry
        .declare_method("res.partner", "label", |rs: &RecordSet| -> MethodResult<String> {
            let base = rs.super_as::<String>(&args![])?.unwrap_or_default();
            Ok(base.to_uppercase())
        })
        .unwrap();
    registry.freeze().unwrap();

    let env = Environment::new(Arc::new(registry), Arc::new(partner_rows()));
    RecordSet::new(Arc::new(env), "res.partner")
}

// =============================================================================
// Purity Tests
// =============================================================================

/// Every query builder leaves the receiver's query, ids and stack as they were.
#[test]
fn test_builders_do_not_touch_receiver() {
    let base = partners();
    let before = base.query().clone();

    let derived = [
        base.filter(Predicate::gt("credit", json!(50))),
        base.exclude(Predicate::eq("name", json!("Bob"))),
        base.set_condition(Condition::new().and(Predicate::lte("credit", json!(100)))),
        base.limit(2),
        base.offset(1),
        base.limit_offset(1, 1),
        base.order_by(&["-credit"]),
        base.group_by(&["name"]),
        base.distinct(),
        base.browse(&[5]),
    ];

    assert_eq!(base.query(), &before);
    assert!(base.ids().is_empty());
    assert_eq!(base.call_depth(), 0);
    for rs in &derived {
        assert_eq!(rs.model_name(), "res.partner");
        assert_eq!(rs.call_depth(), 0);
    }
}

/// Chained filters accumulate on the copy only.
#[test]
fn test_chained_filters_accumulate() {
    let base = partners();
    let high = base.filter(Predicate::gte("credit", json!(100)));
    let named = high.exclude(Predicate::eq("name", json!("Carol")));

    assert_eq!(high.query().condition.terms().len(), 1);
    assert_eq!(named.query().condition.terms().len(), 2);
    assert_eq!(high.search().unwrap().ids(), &[5, 9]);
    assert_eq!(named.search().unwrap().ids(), &[5]);
    assert!(base.query().condition.is_empty());
}

/// Ordering, paging and distinct shape the resolved ids.
#[test]
fn test_ordering_and_paging() {
    let rs = partners().order_by(&["-credit"]);
    assert_eq!(rs.search().unwrap().ids(), &[9, 5, 7]);
    assert_eq!(rs.limit_offset(2, 1).search().unwrap().ids(), &[5, 7]);
    assert_eq!(rs.offset(5).search().unwrap().ids(), &[] as &[i64]);
    assert_eq!(rs.query().order_by, vec![SortSpec::desc("credit")]);
    assert_eq!(rs.distinct().search().unwrap().ids(), &[9, 5, 7]);
}

/// Predicates never match missing fields.
#[test]
fn test_missing_field_never_matches() {
    let rs = partners().filter(Predicate::eq("email", json!(null)));
    assert!(rs.search().unwrap().ids().is_empty());

    let rs = partners().filter(Predicate::lt("credit", json!(100)));
    assert_eq!(rs.search().unwrap().ids(), &[7]);
}

// =============================================================================
// Records Tests
// =============================================================================

/// records() on ids [5, 7, 9] gives three singletons that each dispatch on their own id.
#[test]
fn test_records_dispatch_independently() {
    let all = partners().browse(&[5, 7, 9]);
    let records = all.records().unwrap();
    assert_eq!(records.len(), 3);

    let labels: Vec<String> = records
        .iter()
        .map(|r| r.call_as::<String>("label", &args![]).unwrap().unwrap())
        .collect();
    assert_eq!(labels, vec!["PARTNER #5", "PARTNER #7", "PARTNER #9"]);

    for record in &records {
        assert_eq!(record.ids().len(), 1);
        assert_eq!(record.call_depth(), 0);
    }
    assert_eq!(all.ids(), &[5, 7, 9]);
}

/// records() resolves the pending query first.
#[test]
fn test_records_resolve_query() {
    let records = partners()
        .filter(Predicate::ne("name", json!("Alice")))
        .records()
        .unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.ids()[0]).collect();
    assert_eq!(ids, vec![7, 9]);
}

/// A multi-record set cannot use a method that requires a singleton.
#[test]
fn test_singleton_method_on_many() {
    let err = partners()
        .browse(&[5, 7])
        .call("label", &args![])
        .unwrap_err();
    assert_eq!(err, MethodError::NotASingleton("res.partner(5,7)".into()));
    assert_eq!(err.code(), "ORM_NOT_A_SINGLETON");
}

// =============================================================================
// Ensure One Tests
// =============================================================================

#[test]
fn test_ensure_one() {
    assert!(partners().browse(&[9]).ensure_one().is_ok());
    assert!(partners()
        .filter(Predicate::eq("name", json!("Bob")))
        .ensure_one()
        .is_ok());

    assert!(matches!(
        partners().ensure_one(),
        Err(MethodError::NotASingleton(_))
    ));
    assert!(matches!(
        partners().filter(Predicate::eq("name", json!("Zoe"))).ensure_one(),
        Err(MethodError::NotASingleton(_))
    ));
}

/// Environment data is shared by every record set derived from the same one.
#[test]
fn test_environment_is_shared() {
    let base = partners();
    let derived = base.filter(Predicate::eq("name", json!("Bob"))).browse(&[7]);
    assert!(Arc::ptr_eq(base.env(), derived.env()));
    assert_eq!(base.env().session_id(), derived.env().session_id());
    assert_eq!(derived.env().uid(), 1);
}
