use crate::{
    model::{PropertyModel, ScalarType},
    value::{
        Value,
        wire::{canonical_text, decode, encode},
    },
};
use chrono::{DateTime, NaiveDate, TimeDelta};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

// ---- helpers -----------------------------------------------------------

fn prop_of(scalar: ScalarType) -> PropertyModel {
    PropertyModel {
        name: "Field".to_string(),
        scalar,
        nullable: false,
        ordinal: 0,
    }
}

fn roundtrip(value: Value) -> Value {
    let bytes = encode(&value);
    decode(&bytes, &prop_of(value.kind()), "Sample").expect("decode")
}

#[track_caller]
fn assert_roundtrips(value: Value) {
    assert_eq!(roundtrip(value.clone()), value);
}

// ---- round trips -------------------------------------------------------

#[test]
fn scalar_round_trips() {
    assert_roundtrips(Value::Bool(true));
    assert_roundtrips(Value::Bool(false));
    assert_roundtrips(Value::Char('µ'));
    assert_roundtrips(Value::I8(i8::MIN));
    assert_roundtrips(Value::I16(-12_345));
    assert_roundtrips(Value::I32(i32::MAX));
    assert_roundtrips(Value::I64(i64::MIN));
    assert_roundtrips(Value::U8(255));
    assert_roundtrips(Value::U16(65_535));
    assert_roundtrips(Value::U32(u32::MAX));
    assert_roundtrips(Value::U64(u64::MAX));
    assert_roundtrips(Value::F32(1.5));
    assert_roundtrips(Value::F64(-0.1));
    assert_roundtrips(Value::Text("Unikorn, The Return".into()));
    assert_roundtrips(Value::Enum("Pending".into()));
    assert_roundtrips(Value::Blob(vec![0, 1, 2, 255]));
    assert_roundtrips(Value::Uuid(
        Uuid::from_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap(),
    ));
    assert_roundtrips(Value::Decimal(Decimal::from_str("-123.4500").unwrap()));
}

#[test]
fn temporal_round_trips() {
    let naive = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_nano_opt(23, 59, 59, 123_456_789)
        .unwrap();
    assert_roundtrips(Value::DateTime(naive));

    let whole_seconds = NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_roundtrips(Value::DateTime(whole_seconds));

    let offset = DateTime::parse_from_rfc3339("2024-06-01T12:30:00+05:30").unwrap();
    assert_roundtrips(Value::DateTimeOffset(offset));

    assert_roundtrips(Value::Duration(TimeDelta::new(86_400, 1).unwrap()));
    assert_roundtrips(Value::Duration(TimeDelta::milliseconds(-1_500)));
    assert_roundtrips(Value::Duration(TimeDelta::zero()));
}

#[test]
fn decimal_scale_is_preserved() {
    let value = Value::Decimal(Decimal::from_str("1.20").unwrap());
    let bytes = encode(&value);
    assert_eq!(bytes, b"1.20");
    assert_eq!(roundtrip(value.clone()), value);
}

#[test]
fn blob_bytes_pass_through_unchanged() {
    let bytes = vec![0xDE, 0xAD, 0x00, 0xEF];
    assert_eq!(encode(&Value::Blob(bytes.clone())), bytes);
}

// ---- offset tolerance --------------------------------------------------

#[test]
fn offsetless_timestamp_falls_back_to_zero_offset() {
    let decoded = decode(
        b"2024-06-01T12:30:00",
        &prop_of(ScalarType::DateTimeOffset),
        "Sample",
    )
    .unwrap();

    let expected = DateTime::parse_from_rfc3339("2024-06-01T12:30:00+00:00").unwrap();
    assert_eq!(decoded, Value::DateTimeOffset(expected));
}

#[test]
fn garbage_offset_timestamp_still_fails() {
    let err = decode(b"not a timestamp", &prop_of(ScalarType::DateTimeOffset), "Sample")
        .unwrap_err();
    assert_eq!(err.entity, "Sample");
    assert_eq!(err.declared, ScalarType::DateTimeOffset);
}

// ---- failure shape -----------------------------------------------------

#[test]
fn overflow_is_a_decode_error() {
    let err = decode(b"300", &prop_of(ScalarType::U8), "Sample").unwrap_err();
    assert_eq!(err.property, "Field");
    assert_eq!(err.declared, ScalarType::U8);

    let err = decode(b"2147483648", &prop_of(ScalarType::I32), "Sample").unwrap_err();
    assert_eq!(err.declared, ScalarType::I32);
}

#[test]
fn malformed_text_is_a_decode_error() {
    assert!(decode(b"yes", &prop_of(ScalarType::Bool), "Sample").is_err());
    assert!(decode(b"1.2.3", &prop_of(ScalarType::F64), "Sample").is_err());
    assert!(decode(b"xy", &prop_of(ScalarType::Char), "Sample").is_err());
    assert!(decode(b"\xFF\xFE", &prop_of(ScalarType::Text), "Sample").is_err());
}

#[test]
fn decode_error_names_property_type_and_entity() {
    let err = decode(b"abc", &prop_of(ScalarType::I64), "Customer").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'Field'"));
    assert!(message.contains("I64"));
    assert!(message.contains("'Customer'"));
}

// ---- canonical text ----------------------------------------------------

#[test]
fn canonical_text_is_stable() {
    assert_eq!(canonical_text(&Value::Bool(true)), "true");
    assert_eq!(canonical_text(&Value::I64(-42)), "-42");
    assert_eq!(canonical_text(&Value::Text("a:b".into())), "a:b");
    assert_eq!(
        canonical_text(&Value::Duration(TimeDelta::seconds(2))),
        "2000000000"
    );
    assert_eq!(canonical_text(&Value::Blob(vec![0xAB, 0x01])), "ab01");
}

// ---- property-based round trips ----------------------------------------

proptest! {
    #[test]
    fn i64_round_trips(v in any::<i64>()) {
        prop_assert_eq!(roundtrip(Value::I64(v)), Value::I64(v));
    }

    #[test]
    fn u64_round_trips(v in any::<u64>()) {
        prop_assert_eq!(roundtrip(Value::U64(v)), Value::U64(v));
    }

    #[test]
    fn finite_f64_round_trips(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        prop_assert_eq!(roundtrip(Value::F64(v)), Value::F64(v));
    }

    #[test]
    fn text_round_trips(v in ".*") {
        prop_assert_eq!(roundtrip(Value::Text(v.clone())), Value::Text(v));
    }

    #[test]
    fn blob_round_trips(v in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(roundtrip(Value::Blob(v.clone())), Value::Blob(v));
    }

    #[test]
    fn duration_round_trips(secs in -86_400_000i64..86_400_000, nanos in 0u32..1_000_000_000) {
        let delta = TimeDelta::new(secs, nanos).unwrap();
        prop_assert_eq!(roundtrip(Value::Duration(delta)), Value::Duration(delta));
    }
}
