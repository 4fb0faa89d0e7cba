use crate::{
    change::ChangeRecord,
    db::{
        config::StoreConfig,
        connection::ConnectionProvider,
        executor::{
            load::RowScan,
            mutation::{Condition, StoreOp, TransactionPlan},
        },
        query::QuerySpec,
    },
    model::{EntityModel, ScalarType},
    value::Value,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn customer() -> Arc<EntityModel> {
    EntityModel::builder("Customer")
        .property("Id", ScalarType::I64)
        .property("Name", ScalarType::Text)
        .nullable_property("Nickname", ScalarType::Text)
        .primary_key(["Id"])
        .build()
        .unwrap()
}

fn unikorn() -> Vec<Option<Value>> {
    vec![
        Some(Value::I64(42)),
        Some(Value::Text("Unikorn".into())),
        None,
    ]
}

#[test]
fn insert_writes_non_null_fields_and_indexes_the_key() {
    let record = ChangeRecord::insert(customer(), unikorn()).unwrap();
    let plan = TransactionPlan::build(std::slice::from_ref(&record)).unwrap();

    assert!(plan.conditions().is_empty());
    assert_eq!(plan.records(), 1);
    assert_eq!(plan.ops().len(), 2);

    match &plan.ops()[0] {
        StoreOp::HashSet { key, fields } => {
            assert_eq!(key.as_str(), "carmine:Data:Customer:42");
            // Nickname is null: represented by field absence, not a
            // placeholder value.
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0], ("Id".to_string(), b"42".to_vec()));
            assert_eq!(fields[1], ("Name".to_string(), b"Unikorn".to_vec()));
        }
        other => panic!("expected HashSet, got {other:?}"),
    }

    match &plan.ops()[1] {
        StoreOp::SetAdd { key, member } => {
            assert_eq!(key.as_str(), "carmine:Index:PK:Customer");
            assert_eq!(member, "42");
        }
        other => panic!("expected SetAdd, got {other:?}"),
    }
}

#[test]
fn update_targets_the_original_key_and_requires_the_index() {
    let original = unikorn();
    let mut current = original.clone();
    current[0] = Some(Value::I64(99)); // key mutated in memory
    current[1] = Some(Value::Text("Unikorn, The Return".into()));

    let record = ChangeRecord::update(customer(), current, original).unwrap();
    let plan = TransactionPlan::build(std::slice::from_ref(&record)).unwrap();

    assert_eq!(
        plan.conditions(),
        &[Condition::IndexExists(crate::key::index_key(&customer()))]
    );

    // The write still lands on the row loaded as Id=42.
    match &plan.ops()[0] {
        StoreOp::HashSet { key, fields } => {
            assert_eq!(key.as_str(), "carmine:Data:Customer:42");
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].0, "Id");
            assert_eq!(fields[1], ("Name".to_string(), b"Unikorn, The Return".to_vec()));
        }
        other => panic!("expected HashSet, got {other:?}"),
    }
}

#[test]
fn update_leaves_unchanged_fields_untouched() {
    let original = unikorn();
    let mut current = original.clone();
    current[2] = Some(Value::Text("Uni".into()));

    let record = ChangeRecord::update(customer(), current, original).unwrap();
    let plan = TransactionPlan::build(std::slice::from_ref(&record)).unwrap();

    assert_eq!(plan.ops().len(), 1);
    match &plan.ops()[0] {
        StoreOp::HashSet { fields, .. } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].0, "Nickname");
        }
        other => panic!("expected HashSet, got {other:?}"),
    }
}

#[test]
fn update_deletes_fields_that_became_null() {
    let mut original = unikorn();
    original[2] = Some(Value::Text("Uni".into()));
    let mut current = original.clone();
    current[2] = None;

    let record = ChangeRecord::update(customer(), current, original).unwrap();
    let plan = TransactionPlan::build(std::slice::from_ref(&record)).unwrap();

    assert_eq!(plan.ops().len(), 1);
    match &plan.ops()[0] {
        StoreOp::HashDelete { key, fields } => {
            assert_eq!(key.as_str(), "carmine:Data:Customer:42");
            assert_eq!(fields, &["Nickname".to_string()]);
        }
        other => panic!("expected HashDelete, got {other:?}"),
    }
}

#[test]
fn delete_removes_hash_and_index_entry_by_original_key() {
    let record = ChangeRecord::delete(customer(), unikorn()).unwrap();
    let plan = TransactionPlan::build(std::slice::from_ref(&record)).unwrap();

    assert!(plan.conditions().is_empty());
    assert_eq!(
        plan.ops(),
        &[
            StoreOp::KeyDelete {
                key: crate::key::data_key(
                    &customer(),
                    &crate::key::primary_key_encoding(&customer(), &unikorn()).unwrap()
                ),
            },
            StoreOp::SetRemove {
                key: crate::key::index_key(&customer()),
                member: "42".to_string(),
            },
        ]
    );
}

#[test]
fn batch_produces_one_plan_spanning_all_records() {
    let insert = ChangeRecord::insert(customer(), unikorn()).unwrap();
    let mut second = unikorn();
    second[0] = Some(Value::I64(43));
    let delete = ChangeRecord::delete(customer(), second).unwrap();

    let plan = TransactionPlan::build(&[insert, delete]).unwrap();
    assert_eq!(plan.records(), 2);
    assert_eq!(plan.ops().len(), 4);
}

#[test]
fn empty_batch_is_an_empty_plan() {
    let plan = TransactionPlan::build(&[]).unwrap();
    assert!(plan.is_empty());
    assert!(plan.ops().is_empty());
}

#[tokio::test]
async fn scan_surfaces_cancellation_before_any_round_trip() {
    // Port 1 is never contacted: the token is checked first.
    let config = StoreConfig::new("localhost", 1);
    let provider = Arc::new(ConnectionProvider::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut scan = RowScan::new(QuerySpec::all(customer()), cancel, config, provider);

    let err = scan.next().await.unwrap_err();
    assert!(err.is_cancelled());

    // Cancellation is terminal: the scan is exhausted, not restartable.
    assert!(scan.next().await.unwrap().is_none());
}

#[test]
fn null_primary_key_fails_planning() {
    let mut values = unikorn();
    values[0] = None;
    let record = ChangeRecord::insert(customer(), values).unwrap();

    let err = TransactionPlan::build(std::slice::from_ref(&record)).unwrap_err();
    assert!(err.to_string().contains("cannot be null"));
}
