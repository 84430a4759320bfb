use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Type name of the generic entity schema.
pub const BASE_TYPE: &str = "entity";

/// Numeric identifier of an entity. Always present.
pub const ID: &str = "id";
/// Numeric module discriminator of an entity. Always present.
pub const MODULE_ID: &str = "module_id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

static BASE_SCHEMA: LazyLock<Arc<EntitySchema>> =
    LazyLock::new(|| Arc::new(EntitySchema::new(BASE_TYPE)));

/// The static type of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Stored verbatim; expected to be present.
    Scalar,
    /// Stored verbatim; may be null.
    NullableScalar,
    /// Materialized as a nested entity of the named schema.
    Entity(String),
}

/// A named field in an entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

/// Declares the fixed field table of an entity type.
///
/// Every schema starts with the fields of the generic entity (`id`,
/// `module_id`, `created_at`, `updated_at`); builder calls append to it.
/// Field order is preserved and drives export order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub type_name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Creates a schema holding only the generic entity fields.
    pub fn new(type_name: impl Into<String>) -> Self {
        let base = |name: &str, kind: FieldKind| FieldDef {
            name: name.to_string(),
            kind,
        };
        Self {
            type_name: type_name.into(),
            fields: vec![
                base(ID, FieldKind::Scalar),
                base(MODULE_ID, FieldKind::Scalar),
                base(CREATED_AT, FieldKind::NullableScalar),
                base(UPDATED_AT, FieldKind::NullableScalar),
            ],
        }
    }

    /// The shared generic entity schema.
    pub fn base() -> Arc<EntitySchema> {
        Arc::clone(&BASE_SCHEMA)
    }

    /// Declares (or redeclares) a field.
    ///
    /// The identifying fields keep their scalar kind; redeclaring them is a no-op.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        if name == ID || name == MODULE_ID {
            return self;
        }
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.kind = kind,
            None => self.fields.push(FieldDef { name, kind }),
        }
        self
    }

    /// Shorthand for a scalar field.
    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Scalar)
    }

    /// Shorthand for a nullable scalar field.
    pub fn nullable(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::NullableScalar)
    }

    /// Shorthand for a nested entity field of type `type_name`.
    pub fn entity(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Entity(type_name.into()))
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names of the schemas this one nests, in declaration order.
    pub fn nested_types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|f| match &f.kind {
            FieldKind::Entity(t) => Some((f.name.as_str(), t.as_str())),
            _ => None,
        })
    }
}

/// Resolves entity type names to schemas.
///
/// Always contains the generic [`BASE_TYPE`] schema.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    schemas: HashMap<String, Arc<EntitySchema>>,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(BASE_TYPE.to_string(), EntitySchema::base());
        Self { schemas }
    }
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema, replacing any schema with the same type name.
    pub fn register(&mut self, schema: EntitySchema) -> Arc<EntitySchema> {
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.type_name.clone(), Arc::clone(&schema));
        schema
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Looks up the schema a nested field points at.
    pub fn resolve(&self, type_name: &str, field: &str) -> ModelResult<Arc<EntitySchema>> {
        self.get(type_name)
            .ok_or_else(|| ModelError::UnknownTypeDescriptor {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })
    }

    /// Checks that every nested field of every schema resolves.
    pub fn validate(&self) -> ModelResult<()> {
        let mut names: Vec<&String> = self.schemas.keys().collect();
        names.sort();
        for name in names {
            for (field, type_name) in self.schemas[name].nested_types() {
                self.resolve(type_name, field)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
