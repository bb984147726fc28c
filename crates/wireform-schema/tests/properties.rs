//! Property tests and cross-thread sharing of schema definitions.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use wireform_schema::{CharField, DeclareField, IntegerField, NestedField, Schema, SchemaDef};

fn profile() -> Arc<SchemaDef> {
    let inner = SchemaDef::builder("Inner")
        .field("x", IntegerField::new().required(true))
        .build()
        .unwrap();
    SchemaDef::builder("Profile")
        .field("a", CharField::new().required(true))
        .field("b", CharField::new().required(true))
        .field("c", IntegerField::new().required(true).default_value(3))
        .field("inner", NestedField::new(&inner).required(true))
        .build()
        .unwrap()
}

fn item() -> Arc<SchemaDef> {
    SchemaDef::builder("Line")
        .field("qty", IntegerField::new().required(true).min_value(0))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn partial_never_reports_required(
        a in proptest::option::of("[a-z]{1,8}"),
        b in proptest::option::of("[a-z]{1,8}"),
        c in proptest::option::of(-1000i64..1000),
        inner in proptest::option::of(proptest::option::of(0i64..10)),
    ) {
        let mut payload = Map::new();
        if let Some(a) = &a {
            payload.insert("a".into(), json!(a));
        }
        if let Some(b) = &b {
            payload.insert("b".into(), json!(b));
        }
        if let Some(c) = c {
            payload.insert("c".into(), json!(c));
        }
        if let Some(inner) = inner {
            let mut nested = Map::new();
            if let Some(x) = inner {
                nested.insert("x".into(), json!(x));
            }
            payload.insert("inner".into(), Value::Object(nested));
        }
        let present: BTreeSet<String> = payload.keys().cloned().collect();

        let schema = Schema::new(&profile()).partial(true).request_data(Value::Object(payload));
        prop_assert!(schema.is_valid());
        let validated = schema.validated_data().unwrap().as_object().unwrap();
        let keys: BTreeSet<String> = validated.keys().cloned().collect();
        prop_assert_eq!(keys, present);
    }

    #[test]
    fn list_errors_are_keyed_by_failing_positions(
        quantities in proptest::collection::vec(-20i64..20, 0..12),
    ) {
        let payload: Vec<Value> = quantities.iter().map(|q| json!({"qty": q})).collect();
        let list = Schema::many(&item()).request_data(Value::Array(payload));
        let failing: Vec<usize> = quantities
            .iter()
            .enumerate()
            .filter(|(_, q)| **q < 0)
            .map(|(i, _)| i)
            .collect();

        prop_assert_eq!(list.is_valid(), failing.is_empty());
        match list.errors().unwrap() {
            None => prop_assert_eq!(list.validated_data().unwrap().as_array().unwrap().len(), quantities.len()),
            Some(errors) => {
                let keys: Vec<usize> = errors
                    .to_json()
                    .as_object()
                    .unwrap()
                    .keys()
                    .map(|k| k.parse().unwrap())
                    .collect();
                prop_assert_eq!(keys, failing);
                prop_assert_eq!(list.validated_data().unwrap(), &json!([]));
            }
        }
    }
}

#[test]
fn one_definition_serves_many_threads() {
    let def = SchemaDef::builder("Counter")
        .field("n", IntegerField::new().required(true).max_value(1_000))
        .field("label", CharField::new().default_value("none"))
        .build()
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8i64)
            .map(|t| {
                let def = Arc::clone(&def);
                scope.spawn(move || {
                    for i in 0..200i64 {
                        let n = t * 200 + i;
                        let schema = Schema::new(&def).request_data(json!({"n": n.to_string()}));
                        if n > 1_000 {
                            assert!(!schema.is_valid());
                            assert_eq!(schema.errors().unwrap().unwrap().codes(), vec!["max_value"]);
                        } else {
                            assert!(schema.is_valid());
                            assert_eq!(
                                schema.validated_data().unwrap(),
                                &json!({"n": n, "label": "none"})
                            );
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
