//! Shared test helpers for client tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use brezel_client::{
    Client, ClientBuilder, ClientConfig, HttpRequest, HttpResponse, Transport, TransportError,
};
use serde_json::Value;

/// In-memory transport that records requests and replays queued responses.
///
/// When the queue is empty it answers `200` with an empty JSON object.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn respond_json(&self, status: u16, body: Value) {
        self.respond(json_response(status, body));
    }

    pub fn respond_text(&self, status: u16, body: &str) {
        self.respond(HttpResponse {
            status,
            headers: vec![("Content-Type".into(), "text/plain".into())],
            body: body.as_bytes().to_vec(),
        });
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Other(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json_response(200, serde_json::json!({}))))
    }
}

pub fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: serde_json::to_vec(&body).unwrap(),
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("https://api.example.com", "acme")
}

pub fn builder_with(transport: &Arc<RecordingTransport>, config: ClientConfig) -> ClientBuilder {
    Client::builder(config).transport(transport.clone())
}

pub fn client_with(transport: &Arc<RecordingTransport>, config: ClientConfig) -> Client {
    builder_with(transport, config).build().unwrap()
}
