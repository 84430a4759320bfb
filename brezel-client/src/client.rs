//! Brezel API client.
//!
//! Every path is prefixed with the configured system. Entity endpoints hand
//! response records to the [`EntityRegistry`] to get typed handles back.

use std::fmt;
use std::sync::Arc;

use brezel_model::{EntityHandle, TypedEntity};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{Auth, ClientConfig, IMPERSONATE_HEADER};
use crate::error::{ApiError, ApiResult};
use crate::registry::EntityRegistry;
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Body of an `application/json` response.
    Json(Value),
    /// Any other body, unchanged.
    Text(String),
}

impl Response {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(v) => Some(v),
            Response::Text(_) => None,
        }
    }

    /// The JSON body; a text body is an error.
    pub fn into_json(self) -> ApiResult<Value> {
        match self {
            Response::Json(v) => Ok(v),
            Response::Text(t) => Err(ApiError::UnexpectedResponse(format!(
                "expected JSON, got text body of {} bytes",
                t.len()
            ))),
        }
    }

    /// The body as text. JSON strings are unwrapped, other JSON is re-encoded.
    pub fn into_text(self) -> String {
        match self {
            Response::Text(t) => t,
            Response::Json(Value::String(s)) => s,
            Response::Json(v) => v.to_string(),
        }
    }
}

/// Parameters of a module listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    /// Sent JSON-encoded as `pre_filters`.
    pub filters: Map<String, Value>,
    /// Result count cap; omitted when `None`.
    pub results: Option<u32>,
    /// Relations to eager-load; sent JSON-encoded as `with` when non-empty.
    pub with: Vec<String>,
    /// Additional query parameters. Named parameters above take precedence.
    pub extra: Vec<(String, String)>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            filters: Map::new(),
            results: None,
            with: Vec::new(),
            extra: Vec::new(),
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn results(mut self, results: u32) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.with.push(relation.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Encodes the query string parameters.
    pub fn to_params(&self) -> ApiResult<Vec<(String, String)>> {
        const NAMED: [&str; 4] = ["page", "pre_filters", "results", "with"];
        let mut params: Vec<(String, String)> = self
            .extra
            .iter()
            .filter(|(k, _)| !NAMED.contains(&k.as_str()))
            .cloned()
            .collect();
        params.push(("page".into(), self.page.to_string()));
        params.push(("pre_filters".into(), serde_json::to_string(&self.filters)?));
        if let Some(results) = self.results {
            params.push(("results".into(), results.to_string()));
        }
        if !self.with.is_empty() {
            params.push(("with".into(), serde_json::to_string(&self.with)?));
        }
        Ok(params)
    }
}

/// Builds a [`Client`] with a custom transport or entity registrations.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    registry: EntityRegistry,
}

impl ClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// See [`EntityRegistry::register`].
    pub fn register<T: TypedEntity>(mut self, module: impl Into<String>) -> Self {
        self.registry.register::<T>(module);
        self
    }

    /// See [`EntityRegistry::register_factory`].
    pub fn register_factory<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(
                &brezel_model::SchemaCatalog,
                Map<String, Value>,
            ) -> brezel_model::ModelResult<Box<dyn EntityHandle>>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register_factory(module, factory);
        self
    }

    pub fn register_schema(mut self, schema: brezel_model::EntitySchema) -> Self {
        self.registry.register_schema(schema);
        self
    }

    /// Validates the config and registry, and creates the default transport if none was set.
    pub fn build(self) -> ApiResult<Client> {
        self.config.validate()?;
        self.registry.validate()?;
        let auth = Auth::from_config(&self.config);
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        Ok(Client {
            transport,
            registry: Arc::new(self.registry),
            api_url: self.config.api_url.trim_end_matches('/').to_string(),
            system: self.config.system,
            auth,
            share_url: self.config.share_url,
            impersonate_user_id: self.config.impersonate_user_id,
        })
    }
}

/// Client for one Brezel system.
///
/// Cheap to clone: copies share the transport and the entity registry, and
/// carry their own impersonation state.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    registry: Arc<EntityRegistry>,
    api_url: String,
    system: String,
    auth: Auth,
    share_url: Option<String>,
    impersonate_user_id: Option<i64>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .field("system", &self.system)
            .field("auth", &self.auth)
            .field("share_url", &self.share_url)
            .field("impersonate_user_id", &self.impersonate_user_id)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Client {
    /// Creates a client using `reqwest` and no entity registrations.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            registry: EntityRegistry::new(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    // ── Impersonation ───────────────────────────────────────────

    /// Acts as `user_id` on every following request of this client.
    pub fn impersonate(&mut self, user_id: i64) -> &mut Self {
        self.impersonate_user_id = Some(user_id);
        self
    }

    /// Returns a copy of this client impersonating `user_id`; `self` is untouched.
    pub fn impersonated(&self, user_id: i64) -> Self {
        let mut client = self.clone();
        client.impersonate(user_id);
        client
    }

    pub fn stop_impersonating(&mut self) -> &mut Self {
        self.impersonate_user_id = None;
        self
    }

    pub fn impersonating(&self) -> Option<i64> {
        self.impersonate_user_id
    }

    // ── Share links ─────────────────────────────────────────────

    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }

    pub fn set_share_url(&mut self, share_url: Option<String>) {
        self.share_url = share_url;
    }

    /// URL of a shared file: `{share_url or api_url}/{system}/shared/{token}`.
    pub fn get_shared_file_url(&self, share_token: &str) -> String {
        let base = self
            .share_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or(&self.api_url);
        format!("{base}/{}/shared/{share_token}", self.system)
    }

    // ── Requests ────────────────────────────────────────────────

    /// Sends a request below the system segment.
    pub async fn send(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Value>,
        query: &[(String, String)],
    ) -> ApiResult<Response> {
        let mut segments = Vec::with_capacity(path.len() + 1);
        segments.push(self.system.as_str());
        segments.extend_from_slice(path);
        self.request(method, &segments, body, query).await
    }

    /// Sends a request to a path relative to the API root.
    pub async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Value>,
        query: &[(String, String)],
    ) -> ApiResult<Response> {
        let url = self.url(path)?;

        let mut headers = Vec::new();
        if let Some((name, value)) = self.auth.header() {
            headers.push((name.to_string(), value));
        }
        if let Some(user_id) = self.impersonate_user_id {
            headers.push((IMPERSONATE_HEADER.to_string(), user_id.to_string()));
        }

        let body = body.filter(|b| method != Method::GET && !is_empty(b));

        debug!(
            %method,
            %url,
            impersonating = ?self.impersonate_user_id,
            "dispatching request"
        );

        let response = self
            .transport
            .execute(HttpRequest {
                method,
                url,
                headers,
                query: query.to_vec(),
                body,
            })
            .await?;
        parse_response(response)
    }

    fn url(&self, path: &[&str]) -> ApiResult<String> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ApiError::Config(format!("api_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("api_url cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(path);
        Ok(url.into())
    }

    // ── Entities ────────────────────────────────────────────────

    /// Lists records of `module`, materialized through the registry.
    pub async fn get_entities(
        &self,
        module: &str,
        query: &ListQuery,
    ) -> ApiResult<Vec<Box<dyn EntityHandle>>> {
        let params = query.to_params()?;
        let response = self
            .send(Method::GET, &["modules", module, "resources"], None, &params)
            .await?
            .into_json()?;

        let data = match response {
            Value::Object(mut map) => map.remove("data"),
            _ => None,
        };
        match data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(records)) => records
                .into_iter()
                .map(|record| {
                    self.registry
                        .construct(module, record)
                        .map_err(ApiError::from)
                })
                .collect(),
            Some(_) => Err(ApiError::UnexpectedResponse(format!(
                "`data` of module `{module}` is not an array"
            ))),
        }
    }

    /// Fetches one record of `module`, or `None` if the API answers 404.
    pub async fn get_entity(
        &self,
        module: &str,
        id: i64,
    ) -> ApiResult<Option<Box<dyn EntityHandle>>> {
        let id = id.to_string();
        let response = match self
            .send(Method::GET, &["modules", module, "resources", &id], None, &[])
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                debug!(module, id = %id, "entity not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let record = response.into_json()?;
        Ok(Some(self.registry.construct(module, record)?))
    }

    /// Like [`Client::get_entities`], downcasting each record to `T`.
    pub async fn get_entities_as<T: TypedEntity>(
        &self,
        module: &str,
        query: &ListQuery,
    ) -> ApiResult<Vec<T>> {
        self.get_entities(module, query)
            .await?
            .into_iter()
            .map(|handle| downcast(module, handle))
            .collect()
    }

    /// Like [`Client::get_entity`], downcasting the record to `T`.
    pub async fn get_entity_as<T: TypedEntity>(&self, module: &str, id: i64) -> ApiResult<Option<T>> {
        self.get_entity(module, id)
            .await?
            .map(|handle| downcast(module, handle))
            .transpose()
    }

    pub async fn put_entity(&self, module: &str, id: i64, params: Value) -> ApiResult<Value> {
        let id = id.to_string();
        self.send(Method::PUT, &["modules", module, "resources", &id], Some(params), &[])
            .await?
            .into_json()
    }

    /// Writes an entity back using its exported form.
    pub async fn save_entity(&self, module: &str, entity: &dyn EntityHandle) -> ApiResult<Value> {
        self.put_entity(module, entity.id(), Value::Object(entity.to_exportable()))
            .await
    }

    pub async fn delete_entity(&self, module: &str, id: i64) -> ApiResult<Response> {
        let id = id.to_string();
        self.send(Method::DELETE, &["modules", module, "resources", &id], None, &[])
            .await
    }

    // ── Other endpoints ─────────────────────────────────────────

    pub async fn get_general_info(&self) -> ApiResult<Value> {
        self.send(Method::GET, &["general"], None, &[])
            .await?
            .into_json()
    }

    pub async fn share_file(&self, file_id: i64) -> ApiResult<Value> {
        let file_id = file_id.to_string();
        self.send(Method::POST, &["files", &file_id, "share"], None, &[])
            .await?
            .into_json()
    }

    /// Triggers a webhook event. Absent, empty or zero segments are skipped.
    pub async fn webhook(
        &self,
        event: &str,
        module: Option<&str>,
        entity_id: Option<i64>,
    ) -> ApiResult<Response> {
        let entity_id = entity_id.filter(|id| *id != 0).map(|id| id.to_string());
        let path: Vec<&str> = ["webhook", event]
            .into_iter()
            .chain(module)
            .chain(entity_id.as_deref())
            .filter(|s| !s.is_empty())
            .collect();
        self.send(Method::POST, &path, None, &[]).await
    }

    pub async fn get_shared_file_contents(&self, share_token: &str) -> ApiResult<String> {
        Ok(self
            .send(Method::GET, &["shared", share_token], None, &[])
            .await?
            .into_text())
    }
}

fn downcast<T: TypedEntity>(module: &str, handle: Box<dyn EntityHandle>) -> ApiResult<T> {
    handle
        .into_any()
        .downcast::<T>()
        .map(|t| *t)
        .map_err(|_| ApiError::UnexpectedEntityType {
            module: module.to_string(),
            expected: T::TYPE_NAME,
        })
}

fn is_empty(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn parse_response(response: HttpResponse) -> ApiResult<Response> {
    let status = response.status;
    if !response.is_success() {
        let body = response.text();
        warn!(status, "API request failed");
        return Err(ApiError::Status { status, body });
    }
    if response.is_json() {
        serde_json::from_slice(&response.body)
            .map(Response::Json)
            .map_err(|source| ApiError::Decode { status, source })
    } else {
        Ok(Response::Text(response.text()))
    }
}
