//! Typed client for the Brezel REST API.
//!
//! - [`Client`]: authenticated, system-scoped requests and entity endpoints
//! - [`ClientConfig`]: connection settings (URL, system, credentials)
//! - [`EntityRegistry`]: which type each module's records materialize as
//! - [`Transport`]: the HTTP layer, [`ReqwestTransport`] by default
//!
//! # Example
//!
//! ```no_run
//! use brezel_client::model::EntityHandle;
//! use brezel_client::{Client, ClientConfig, ListQuery};
//!
//! # async fn run() -> brezel_client::ApiResult<()> {
//! let client = Client::new(ClientConfig::new("https://api.brezel.io", "acme").with_api_key("key"))?;
//!
//! let open = client
//!     .get_entities("tickets", &ListQuery::new().filter("status", "open"))
//!     .await?;
//! for ticket in &open {
//!     println!("{} {:?}", ticket.id(), ticket.get("title"));
//! }
//!
//! // Act as another user without touching the shared client.
//! let as_bob = client.impersonated(42);
//! let _ticket = as_bob.get_entity("tickets", 7).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod registry;
mod transport;

pub use client::{Client, ClientBuilder, ListQuery, Response};
pub use config::{
    API_KEY_HEADER, AUTHORIZATION_HEADER, Auth, ClientConfig, DEFAULT_USER_AGENT,
    IMPERSONATE_HEADER,
};
pub use error::{ApiError, ApiResult, TransportError};
pub use registry::{EntityFactory, EntityRegistry};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

pub use brezel_model as model;
