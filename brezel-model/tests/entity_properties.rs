//! Property-based tests for entity materialization.
//!
//! These verify the guarantees callers rely on when moving records between the
//! API and typed entities:
//! - Export is a superset of the source: every source key survives with an
//!   equivalent value
//! - Round-trip idempotence: materialize(export(materialize(x))) == materialize(x)
//! - Every source key and every declared field name is reported by `has`

use std::sync::Arc;

use brezel_model::{Entity, EntitySchema, SchemaCatalog};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

fn json_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn nested_source_strategy() -> impl Strategy<Value = Value> {
    (any::<i64>(), any::<i64>(), prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..3))
        .prop_map(|(id, module_id, extra)| {
            let mut map: Map<String, Value> = extra.into_iter().collect();
            map.insert("id".into(), id.into());
            map.insert("module_id".into(), module_id.into());
            Value::Object(map)
        })
}

/// A source record for the `ticket` schema: identifiers, a few declared
/// fields and some open attributes.
fn source_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (
        any::<i64>(),
        any::<i64>(),
        prop::option::of(scalar_strategy()),
        prop::option::of(prop_oneof![Just(Value::Null), nested_source_strategy()]),
        prop::collection::btree_map("x_[a-z]{1,6}", json_strategy(), 0..5),
    )
        .prop_map(|(id, module_id, title, owner, extra)| {
            let mut map = Map::new();
            for (k, v) in extra {
                map.insert(k, v);
            }
            map.insert("id".into(), id.into());
            map.insert("module_id".into(), module_id.into());
            if let Some(title) = title {
                map.insert("title".into(), title);
            }
            if let Some(owner) = owner {
                map.insert("owner".into(), owner);
            }
            map
        })
}

fn setup() -> (SchemaCatalog, Arc<EntitySchema>) {
    let mut catalog = SchemaCatalog::new();
    let schema = catalog.register(
        EntitySchema::new("ticket")
            .scalar("title")
            .nullable("due")
            .entity("owner", "entity"),
    );
    (catalog, schema)
}

/// `exported` covers `source`: equal, or for nested objects, recursively covering.
fn covers(exported: &Value, source: &Value) -> bool {
    match (exported, source) {
        (Value::Object(e), Value::Object(s)) => s
            .iter()
            .all(|(k, v)| e.get(k).is_some_and(|ev| covers(ev, v))),
        _ => exported == source,
    }
}

proptest! {
    #[test]
    fn export_is_superset_of_source(source in source_strategy()) {
        let (catalog, schema) = setup();
        let entity = Entity::from_map(&catalog, schema, source.clone()).unwrap();
        let exported = Value::Object(entity.to_exportable());
        prop_assert!(covers(&exported, &Value::Object(source)));
    }

    #[test]
    fn roundtrip_is_idempotent(source in source_strategy()) {
        let (catalog, schema) = setup();
        let first = Entity::from_map(&catalog, Arc::clone(&schema), source).unwrap();
        let second = Entity::from_map(&catalog, schema, first.to_exportable()).unwrap();
        prop_assert_eq!(&second, &first);
        prop_assert_eq!(second.to_exportable(), first.to_exportable());
    }

    #[test]
    fn has_covers_source_and_declared_fields(source in source_strategy()) {
        let (catalog, schema) = setup();
        let entity = Entity::from_map(&catalog, Arc::clone(&schema), source.clone()).unwrap();
        for key in source.keys() {
            prop_assert!(entity.has(key));
        }
        for name in schema.field_names() {
            prop_assert!(entity.has(name));
        }
    }

    #[test]
    fn unset_semantics(source in source_strategy()) {
        let (catalog, schema) = setup();
        let mut entity = Entity::from_map(&catalog, schema, source.clone()).unwrap();

        entity.unset("title").unwrap();
        prop_assert!(entity.has("title"));
        prop_assert!(entity.get("title").is_none());

        for key in source.keys().filter(|k| k.starts_with("x_")) {
            entity.unset(key).unwrap();
            prop_assert!(!entity.has(key));
        }
        prop_assert!(entity.attributes().is_empty());
    }
}

#[test]
fn covers_helper_sanity() {
    assert!(covers(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    assert!(!covers(&json!({"a": 1}), &json!({"a": 2})));
    assert!(covers(&json!({"o": {"id": 1, "x": null}}), &json!({"o": {"id": 1}})));
}
