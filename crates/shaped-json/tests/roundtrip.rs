//! Property tests: shaping and unshaping agree for arbitrary values.

use proptest::prelude::*;

use shaped_json::{
    at, at_homogeneous, at_homogeneous_sized, decode, encode, stringify_value, to_json_string,
    DecodeError, MemoryShapeTable, ShapeTable, ShapeType, Value,
};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,10}"
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        (-1e12f64..1e12f64).prop_map(Value::Number),
        ".{0,12}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map(arb_key(), inner, 0..6)
                .prop_map(|members| Value::Object(members.into_iter().collect())),
        ]
    })
}

/// Reverses the member order of every object in the tree.
fn reversed(value: &Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.iter().map(reversed).collect()),
        Value::Object(members) => Value::Object(
            members
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), reversed(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(value in arb_value()) {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &value).unwrap();
        let decoded = decode(&table, &doc).unwrap();
        prop_assert_eq!(decoded.sorted(), value.sorted());
    }

    #[test]
    fn prop_key_order_does_not_change_shape(value in arb_value()) {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &value).unwrap();
        let shapes = table.len_shapes();
        let other = encode(&mut table, &reversed(&value)).unwrap();
        prop_assert_eq!(doc.sid, other.sid);
        prop_assert_eq!(&doc.data, &other.data);
        prop_assert_eq!(table.len_shapes(), shapes);
    }

    #[test]
    fn prop_stringify_matches_decode(value in arb_value()) {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &value).unwrap();
        let mut expected = String::new();
        stringify_value(&decode(&table, &doc).unwrap(), &mut expected);
        prop_assert_eq!(to_json_string(&table, &doc).unwrap(), expected);
    }

    #[test]
    fn prop_random_access_agrees(items in prop::collection::vec(arb_value(), 1..8)) {
        let mut table = MemoryShapeTable::new();
        let doc = encode(&mut table, &Value::List(items.clone())).unwrap();
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        let whole = decode(&table, &doc).unwrap();
        let whole = whole.as_list().unwrap();

        let locate = |index: usize| match shape.shape_type() {
            ShapeType::List => at(shape, &doc.data, index),
            ShapeType::HomogeneousList => at_homogeneous(shape, &doc.data, index),
            ShapeType::HomogeneousSizedList => at_homogeneous_sized(shape, &doc.data, index),
            other => panic!("unexpected list shape {other:?}"),
        };

        for (i, expected) in whole.iter().enumerate() {
            let entry = locate(i).unwrap();
            let element = decode(&table, &entry.as_shaped_ref().to_document()).unwrap();
            prop_assert_eq!(&element, expected);
        }
        prop_assert_eq!(
            locate(items.len()),
            Err(DecodeError::IndexOutOfBounds { index: items.len(), len: items.len() })
        );
    }
}

#[test]
fn test_homogeneous_detection() {
    let mut table = MemoryShapeTable::new();
    let cases = [
        (Value::List(vec![1.into(), 2.into(), 3.into()]), ShapeType::HomogeneousSizedList),
        (Value::List(vec![1.into(), "a".into()]), ShapeType::List),
        (Value::List(vec!["abc".into(), "abcdef".into()]), ShapeType::HomogeneousSizedList),
        (
            Value::List(vec!["short".into(), "a-very-long-string-that-exceeds-the-short-string-capacity".into()]),
            ShapeType::List,
        ),
        (Value::List(vec!["seven77".into(), "eight888".into()]), ShapeType::HomogeneousList),
        (Value::List(vec!["seven77".into(), "7seven7".into()]), ShapeType::HomogeneousSizedList),
    ];
    for (value, expected) in cases {
        let doc = encode(&mut table, &value).unwrap();
        let shape = table.lookup_shape_by_id(doc.sid).unwrap();
        assert_eq!(shape.shape_type(), expected, "{value:?}");
    }
}

#[test]
fn test_interning_is_idempotent() {
    let mut table = MemoryShapeTable::new();
    let a = Value::object([
        ("id", Value::from(1)),
        ("tags", Value::List(vec!["x".into()])),
        ("title", Value::from("first title")),
    ]);
    let b = Value::object([
        ("title", Value::from("another, longer title")),
        ("id", Value::from(2)),
        ("tags", Value::List(vec!["y".into()])),
    ]);
    let first = encode(&mut table, &a).unwrap();
    let shapes = table.len_shapes();
    let second = encode(&mut table, &b).unwrap();
    assert_eq!(first.sid, second.sid);
    assert_eq!(table.len_shapes(), shapes);
}

#[test]
fn test_empty_containers() {
    let mut table = MemoryShapeTable::new();
    for value in [Value::List(vec![]), Value::Object(vec![])] {
        let first = encode(&mut table, &value).unwrap();
        let second = encode(&mut table, &value).unwrap();
        assert_eq!(first, second);
        assert_eq!(decode(&table, &first).unwrap(), value);
    }
}
