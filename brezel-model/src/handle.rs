use std::any::Any;
use std::fmt;

use serde_json::{Map, Value};

use crate::entity::{Entity, FieldValue};
use crate::error::ModelResult;
use crate::schema::{BASE_TYPE, EntitySchema, SchemaCatalog};

/// A domain type backed by a materialized [`Entity`].
///
/// Implementors declare their static schema and wrap the entity the client
/// materializes for them. Most modules do NOT need one; the generic
/// [`Entity`] is returned when nothing is registered.
///
/// ```
/// use brezel_model::{Entity, EntitySchema, SchemaCatalog, TypedEntity, materialize_typed};
/// use serde_json::json;
///
/// #[derive(Debug)]
/// struct Ticket(Entity);
///
/// impl TypedEntity for Ticket {
///     const TYPE_NAME: &'static str = "ticket";
///
///     fn schema() -> EntitySchema {
///         EntitySchema::new(Self::TYPE_NAME).scalar("title").entity("owner", "entity")
///     }
///
///     fn from_entity(entity: Entity) -> Self {
///         Ticket(entity)
///     }
///
///     fn as_entity(&self) -> &Entity {
///         &self.0
///     }
///
///     fn as_entity_mut(&mut self) -> &mut Entity {
///         &mut self.0
///     }
/// }
///
/// let source = json!({"id": 1, "module_id": 5, "title": "x", "owner": {"id": 2, "module_id": 9}});
/// let ticket: Ticket = materialize_typed(&SchemaCatalog::new(), source.as_object().unwrap().clone()).unwrap();
/// assert_eq!(ticket.0.get_entity("owner").unwrap().id(), 2);
/// ```
pub trait TypedEntity: fmt::Debug + Send + Sync + Sized + 'static {
    /// Name the schema is registered under in a [`SchemaCatalog`].
    const TYPE_NAME: &'static str;

    fn schema() -> EntitySchema;

    /// Registers the schemas this type's nested fields point at.
    ///
    /// Types that only nest the generic entity can rely on the default.
    fn register_nested(catalog: &mut SchemaCatalog) {
        let _ = catalog;
    }

    fn from_entity(entity: Entity) -> Self;

    fn as_entity(&self) -> &Entity;

    fn as_entity_mut(&mut self) -> &mut Entity;
}

impl TypedEntity for Entity {
    const TYPE_NAME: &'static str = BASE_TYPE;

    fn schema() -> EntitySchema {
        EntitySchema::new(BASE_TYPE)
    }

    fn from_entity(entity: Entity) -> Self {
        entity
    }

    fn as_entity(&self) -> &Entity {
        self
    }

    fn as_entity_mut(&mut self) -> &mut Entity {
        self
    }
}

/// Materializes `source` as `T`, using the catalog's schema for `T` when registered.
pub fn materialize_typed<T: TypedEntity>(
    catalog: &SchemaCatalog,
    source: Map<String, Value>,
) -> ModelResult<T> {
    let schema = catalog
        .get(T::TYPE_NAME)
        .unwrap_or_else(|| std::sync::Arc::new(T::schema()));
    Entity::from_map(catalog, schema, source).map(T::from_entity)
}

/// The keyed-access capability shared by every entity variant.
///
/// This is what the client hands out for registry-constructed entities.
/// Use [`EntityHandle::into_any`] or [`EntityHandle::as_any`] to get the
/// concrete type back.
pub trait EntityHandle: fmt::Debug + Send + Sync {
    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    fn id(&self) -> i64 {
        self.entity().id()
    }

    fn module_id(&self) -> i64 {
        self.entity().module_id()
    }

    fn type_name(&self) -> &str {
        self.entity().type_name()
    }

    fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entity().get(key)
    }

    fn has(&self, key: &str) -> bool {
        self.entity().has(key)
    }

    fn set(&mut self, key: &str, value: FieldValue) -> ModelResult<()> {
        self.entity_mut().set(key, value)
    }

    fn unset(&mut self, key: &str) -> ModelResult<Option<FieldValue>> {
        self.entity_mut().unset(key)
    }

    fn to_exportable(&self) -> Map<String, Value> {
        self.entity().to_exportable()
    }
}

impl<T: TypedEntity> EntityHandle for T {
    fn entity(&self) -> &Entity {
        self.as_entity()
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self.as_entity_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
