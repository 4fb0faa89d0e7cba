use crate::{
    key::{
        KeyError, data_key, encode_key_part, escape, index_key, primary_key_encoding,
        sequence_key,
    },
    model::{EntityModel, ScalarType},
    value::Value,
};
use std::sync::Arc;

fn order_line() -> Arc<EntityModel> {
    EntityModel::builder("Order:Line")
        .property("Order", ScalarType::I64)
        .property("Line", ScalarType::I32)
        .nullable_property("Note", ScalarType::Text)
        .primary_key(["Order", "Line"])
        .build()
        .unwrap()
}

#[test]
fn escape_replaces_every_separator() {
    assert_eq!(escape("a:b:c"), r"a\x3Ab\x3Ac");
    assert_eq!(escape("plain"), "plain");
}

#[test]
fn key_part_escapes_embedded_separator() {
    assert_eq!(encode_key_part(&Value::Text("a:b".into())), r"a\x3Ab");
    assert_eq!(encode_key_part(&Value::I64(-7)), "-7");
}

#[test]
fn composite_encoding_joins_in_declaration_order() {
    let model = order_line();
    let values = vec![Some(Value::I64(42)), Some(Value::I32(3)), None];

    let encoding = primary_key_encoding(&model, &values).unwrap();
    assert_eq!(encoding.as_str(), "42::3");
}

#[test]
fn null_primary_key_part_is_rejected() {
    let model = order_line();
    let values = vec![Some(Value::I64(42)), None, None];

    let err = primary_key_encoding(&model, &values).unwrap_err();
    assert!(matches!(
        err,
        KeyError::NullPrimaryKey { ref property, .. } if property == "Line"
    ));
}

#[test]
fn key_names_match_the_wire_contract() {
    let model = order_line();
    let values = vec![Some(Value::I64(42)), Some(Value::I32(3)), None];
    let encoding = primary_key_encoding(&model, &values).unwrap();

    assert_eq!(
        index_key(&model).as_str(),
        r"carmine:Index:PK:Order\x3ALine"
    );
    assert_eq!(
        data_key(&model, &encoding).as_str(),
        r"carmine:Data:Order\x3ALine:42::3"
    );
    assert_eq!(
        sequence_key(&model, model.property("Line").unwrap()).as_str(),
        r"carmine:ValueGenerator:Order\x3ALine:Line"
    );
}

#[test]
fn encoding_is_deterministic() {
    let model = order_line();
    let values = vec![Some(Value::I64(1)), Some(Value::I32(2)), None];

    let first = primary_key_encoding(&model, &values).unwrap();
    let second = primary_key_encoding(&model, &values).unwrap();
    assert_eq!(first, second);
}
