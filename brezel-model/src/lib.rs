//! Entity model for the Brezel client.
//!
//! Turns the flat JSON records returned by a Brezel system into typed entities:
//! - [`EntitySchema`]: the static field table of an entity type (scalar,
//!   nullable scalar, or nested entity of another type)
//! - [`SchemaCatalog`]: resolves nested entity type names to schemas
//! - [`Entity`]: a materialized record with declared fields plus an open
//!   attribute map for everything the schema does not name
//! - [`EntityHandle`] / [`TypedEntity`]: the capability shared by the generic
//!   entity and domain-specific wrappers around it
//!
//! Materialization is pure and synchronous. The client crate feeds it response
//! bodies; [`Entity::to_exportable`] turns an entity back into the flat mapping
//! the API speaks.

mod entity;
mod error;
mod handle;
mod schema;

pub use entity::{Attributes, Entity, FieldValue};
pub use error::{ModelError, ModelResult};
pub use handle::{EntityHandle, TypedEntity, materialize_typed};
pub use schema::{
    BASE_TYPE, CREATED_AT, EntitySchema, FieldDef, FieldKind, ID, MODULE_ID, SchemaCatalog,
    UPDATED_AT,
};
