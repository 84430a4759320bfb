//! Module → entity constructor table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use brezel_model::{
    Entity, EntityHandle, EntitySchema, ModelError, ModelResult, SchemaCatalog, TypedEntity,
    materialize_typed,
};
use serde_json::{Map, Value};

/// Builds an entity handle from a response record.
pub type EntityFactory =
    Arc<dyn Fn(&SchemaCatalog, Map<String, Value>) -> ModelResult<Box<dyn EntityHandle>> + Send + Sync>;

/// Maps module names to the constructor used for their records.
///
/// Modules without a registration produce the generic [`Entity`]. The
/// registry is configured before the client is built and is read-only
/// afterwards.
#[derive(Clone, Default)]
pub struct EntityRegistry {
    catalog: SchemaCatalog,
    factories: HashMap<String, EntityFactory>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modules: Vec<&String> = self.factories.keys().collect();
        modules.sort();
        f.debug_struct("EntityRegistry")
            .field("modules", &modules)
            .field("schemas", &self.catalog.len())
            .finish()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns records of `module` as `T`.
    ///
    /// Registers `T`'s schema, and the schemas its nested fields name, in the
    /// registry's catalog.
    pub fn register<T: TypedEntity>(&mut self, module: impl Into<String>) -> &mut Self {
        self.catalog.register(T::schema());
        T::register_nested(&mut self.catalog);
        let factory: EntityFactory = Arc::new(|catalog: &SchemaCatalog, attributes: Map<String, Value>| {
            materialize_typed::<T>(catalog, attributes)
                .map(|t| Box::new(t) as Box<dyn EntityHandle>)
        });
        self.factories.insert(module.into(), factory);
        self
    }

    /// Returns records of `module` through a custom factory.
    pub fn register_factory<F>(&mut self, module: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&SchemaCatalog, Map<String, Value>) -> ModelResult<Box<dyn EntityHandle>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(module.into(), Arc::new(factory));
        self
    }

    /// Adds a schema that factories or nested fields refer to by name.
    pub fn register_schema(&mut self, schema: EntitySchema) -> &mut Self {
        self.catalog.register(schema);
        self
    }

    pub fn is_registered(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Checks every nested type named by a registered schema resolves.
    pub fn validate(&self) -> ModelResult<()> {
        self.catalog.validate()
    }

    /// Materializes a record of `module` with its registered constructor.
    pub fn construct(&self, module: &str, record: Value) -> ModelResult<Box<dyn EntityHandle>> {
        let attributes = match record {
            Value::Object(map) => map,
            _ => return Err(ModelError::NotAnObject(module.to_string())),
        };
        match self.factories.get(module) {
            Some(factory) => factory(&self.catalog, attributes),
            None => Entity::from_map(&self.catalog, EntitySchema::base(), attributes)
                .map(|e| Box::new(e) as Box<dyn EntityHandle>),
        }
    }
}
