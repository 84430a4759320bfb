use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::schema::{EntitySchema, FieldKind, ID, MODULE_ID, SchemaCatalog};

/// Ordered source mapping an entity is materialized from.
pub type Attributes = IndexMap<String, FieldValue>;

/// A value held by an entity field.
///
/// `Entity` marks a value that is already materialized; it is stored as-is
/// wherever it lands and never re-wrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Entity(Box<Entity>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Json(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            FieldValue::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            FieldValue::Entity(e) => Some(e),
            FieldValue::Json(_) => None,
        }
    }

    /// Exported JSON form; nested entities are exported recursively.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Json(v) => v.clone(),
            FieldValue::Entity(e) => Value::Object(e.to_exportable()),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldValue::Entity(_) => "an entity",
            FieldValue::Json(Value::Null) => "null",
            FieldValue::Json(Value::Bool(_)) => "a boolean",
            FieldValue::Json(Value::Number(_)) => "a non-integer number",
            FieldValue::Json(Value::String(_)) => "a string",
            FieldValue::Json(Value::Array(_)) => "an array",
            FieldValue::Json(Value::Object(_)) => "an object",
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

impl From<Entity> for FieldValue {
    fn from(entity: Entity) -> Self {
        FieldValue::Entity(Box::new(entity))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Json(v) => v.serialize(serializer),
            FieldValue::Entity(e) => e.serialize(serializer),
        }
    }
}

/// A materialized API record.
///
/// Fields named by the entity's [`EntitySchema`] live in fixed slots; every
/// other key lands in the open attribute map. Lookups search the declared
/// slots first, then the open map.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    id: i64,
    module_id: i64,
    /// One slot per schema field, `None` meaning null.
    values: Vec<Option<FieldValue>>,
    attributes: IndexMap<String, FieldValue>,
}

impl Entity {
    /// Creates an entity with every declared field other than the identifiers null.
    pub fn new(schema: Arc<EntitySchema>, id: i64, module_id: i64) -> Self {
        let mut entity = Self {
            values: vec![None; schema.fields().len()],
            schema,
            id,
            module_id,
            attributes: IndexMap::new(),
        };
        entity.store(ID.to_string(), FieldValue::Json(id.into()));
        entity.store(MODULE_ID.to_string(), FieldValue::Json(module_id.into()));
        entity
    }

    /// Materializes `source` as an entity of type `schema`.
    ///
    /// `id` and `module_id` are assigned first. Remaining keys are processed in
    /// arrival order: already-materialized entities are stored as-is, values
    /// for declared nested-entity fields are materialized recursively using
    /// `catalog`, other declared fields are assigned verbatim and undeclared
    /// keys go to the open attribute map.
    pub fn materialize(
        catalog: &SchemaCatalog,
        schema: Arc<EntitySchema>,
        source: Attributes,
    ) -> ModelResult<Self> {
        let id = required_integer(&source, ID)?;
        let module_id = required_integer(&source, MODULE_ID)?;
        let mut entity = Self::new(schema, id, module_id);

        for (key, value) in source {
            let value = entity.resolve_value(catalog, &key, value)?;
            entity.store(key, value);
        }
        Ok(entity)
    }

    /// Materializes a JSON object.
    pub fn from_map(
        catalog: &SchemaCatalog,
        schema: Arc<EntitySchema>,
        source: Map<String, Value>,
    ) -> ModelResult<Self> {
        let source = source
            .into_iter()
            .map(|(k, v)| (k, FieldValue::Json(v)))
            .collect();
        Self::materialize(catalog, schema, source)
    }

    /// Materializes a JSON value, which must be an object.
    pub fn from_json(
        catalog: &SchemaCatalog,
        schema: Arc<EntitySchema>,
        source: Value,
    ) -> ModelResult<Self> {
        match source {
            Value::Object(map) => Self::from_map(catalog, schema, map),
            _ => Err(ModelError::NotAnObject(schema.type_name.clone())),
        }
    }

    /// Materializes a JSON object as a generic entity.
    pub fn base(source: Map<String, Value>) -> ModelResult<Self> {
        Self::from_map(&SchemaCatalog::default(), EntitySchema::base(), source)
    }

    /// Re-materializes this entity as another type, keeping nested entities as-is.
    pub fn convert(self, catalog: &SchemaCatalog, schema: Arc<EntitySchema>) -> ModelResult<Self> {
        Self::materialize(catalog, schema, self.into_attributes())
    }

    fn resolve_value(
        &self,
        catalog: &SchemaCatalog,
        key: &str,
        value: FieldValue,
    ) -> ModelResult<FieldValue> {
        let json = match value {
            FieldValue::Entity(_) => return Ok(value),
            FieldValue::Json(json) => json,
        };
        match self.schema.get(key).map(|f| &f.kind) {
            Some(FieldKind::Entity(type_name)) if !json.is_null() => {
                let nested = catalog.resolve(type_name, key)?;
                let map = match json {
                    Value::Object(map) => map,
                    _ => return Err(ModelError::NotAnObject(key.to_string())),
                };
                let entity = Self::from_map(catalog, nested, map)?;
                Ok(FieldValue::Entity(Box::new(entity)))
            }
            _ => Ok(FieldValue::Json(json)),
        }
    }

    /// Puts a value in its declared slot, or in the open attribute map.
    fn store(&mut self, key: String, value: FieldValue) {
        match self.schema.position(&key) {
            Some(idx) => self.values[idx] = (!value.is_null()).then_some(value),
            None => {
                self.attributes.insert(key, value);
            }
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn module_id(&self) -> i64 {
        self.module_id
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        &self.schema.type_name
    }

    /// The open attribute map.
    pub fn attributes(&self) -> &IndexMap<String, FieldValue> {
        &self.attributes
    }

    /// Returns the value for `key`, or `None` when it is absent or null.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match self.schema.position(key) {
            Some(idx) => self.values[idx].as_ref(),
            None => self.attributes.get(key).filter(|v| !v.is_null()),
        }
    }

    /// Exported JSON value for `key`; `Value::Null` when absent.
    pub fn get_json(&self, key: &str) -> Value {
        self.get(key).map_or(Value::Null, FieldValue::to_json)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_json).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_json).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_json).and_then(Value::as_bool)
    }

    pub fn get_entity(&self, key: &str) -> Option<&Entity> {
        self.get(key).and_then(FieldValue::as_entity)
    }

    /// True if `key` is a declared field or present in the open attribute map.
    pub fn has(&self, key: &str) -> bool {
        self.schema.is_declared(key) || self.attributes.contains_key(key)
    }

    /// Overwrites a declared field, or inserts into the open attribute map.
    ///
    /// Declared fields are not re-validated against their kind. The identifying
    /// fields only accept integers.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> ModelResult<()> {
        let key = key.into();
        let value = value.into();
        if key == ID || key == MODULE_ID {
            let n = integer(&key, &value)?;
            if key == ID {
                self.id = n;
            } else {
                self.module_id = n;
            }
        }
        self.store(key, value);
        Ok(())
    }

    /// Nulls a declared field or removes an open attribute.
    ///
    /// Declared fields are never removed, so `has` stays true for them.
    /// Returns the previous value.
    pub fn unset(&mut self, key: &str) -> ModelResult<Option<FieldValue>> {
        if key == ID || key == MODULE_ID {
            return Err(ModelError::invalid_required(key, "null"));
        }
        Ok(match self.schema.position(key) {
            Some(idx) => self.values[idx].take(),
            None => self.attributes.shift_remove(key),
        })
    }

    /// Flattens the entity into a single JSON-compatible mapping.
    ///
    /// Identifying fields come first and are written again last, so an open
    /// attribute can never shadow them.
    pub fn to_exportable(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert(ID.to_string(), self.id.into());
        out.insert(MODULE_ID.to_string(), self.module_id.into());
        for (def, value) in self.schema.fields().iter().zip(&self.values) {
            let value = value.as_ref().map_or(Value::Null, FieldValue::to_json);
            out.insert(def.name.clone(), value);
        }
        for (key, value) in &self.attributes {
            out.insert(key.clone(), value.to_json());
        }
        out.insert(ID.to_string(), self.id.into());
        out.insert(MODULE_ID.to_string(), self.module_id.into());
        out
    }

    /// Consumes the entity into an ordered source mapping.
    ///
    /// Unlike [`Entity::to_exportable`], nested entities are kept as instances.
    pub fn into_attributes(self) -> Attributes {
        let mut out = Attributes::with_capacity(self.values.len() + self.attributes.len());
        for (def, value) in self.schema.fields().iter().zip(self.values) {
            out.insert(
                def.name.clone(),
                value.unwrap_or(FieldValue::Json(Value::Null)),
            );
        }
        for (key, value) in self.attributes {
            out.insert(key, value);
        }
        out.insert(ID.to_string(), FieldValue::Json(self.id.into()));
        out.insert(MODULE_ID.to_string(), FieldValue::Json(self.module_id.into()));
        out
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_exportable().serialize(serializer)
    }
}

fn required_integer(source: &Attributes, field: &str) -> ModelResult<i64> {
    let value = source
        .get(field)
        .ok_or_else(|| ModelError::MissingRequiredField(field.to_string()))?;
    integer(field, value)
}

fn integer(field: &str, value: &FieldValue) -> ModelResult<i64> {
    value
        .as_json()
        .and_then(Value::as_i64)
        .ok_or_else(|| ModelError::invalid_required(field, value.describe()))
}
