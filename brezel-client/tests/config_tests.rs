use std::collections::HashMap;

use brezel_client::{ApiError, Auth, Client, ClientConfig, DEFAULT_USER_AGENT};

// ── Config defaults ─────────────────────────────────────────────

#[test]
fn client_config_default() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.api_url, "http://localhost");
    assert!(cfg.system.is_empty());
    assert!(cfg.api_key.is_none());
    assert!(cfg.bearer_token.is_none());
    assert!(cfg.share_url.is_none());
    assert!(cfg.impersonate_user_id.is_none());
    assert_eq!(cfg.timeout_secs, 30);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert!(DEFAULT_USER_AGENT.starts_with("brezel-client/"));
}

#[test]
fn client_config_debug_redacts_secrets() {
    let cfg = ClientConfig::new("https://api.example.com", "acme")
        .with_api_key("super-secret")
        .with_bearer_token("also-secret");
    let debug = format!("{:?}", cfg);
    assert!(debug.contains("api_url"));
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("super-secret"));
    assert!(!debug.contains("also-secret"));
}

#[test]
fn client_config_serde_roundtrip() {
    let cfg = ClientConfig::new("https://api.example.com", "acme").with_share_url("https://s.example.com");
    let json = serde_json::to_string(&cfg).unwrap();
    let deserialized: ClientConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.api_url, "https://api.example.com");
    assert_eq!(deserialized.system, "acme");
    assert_eq!(deserialized.share_url.as_deref(), Some("https://s.example.com"));
}

#[test]
fn client_config_deserialize_fills_defaults() {
    let cfg: ClientConfig =
        serde_json::from_str(r#"{"api_url": "https://x.example.com", "system": "s"}"#).unwrap();
    assert_eq!(cfg.timeout_secs, 30);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
}

// ── Environment ─────────────────────────────────────────────────

#[test]
fn from_lookup_reads_variables() {
    let vars: HashMap<&str, &str> = [
        ("BREZEL_API_URL", "https://api.example.com"),
        ("BREZEL_SYSTEM", "acme"),
        ("BREZEL_API_KEY", "k"),
        ("BREZEL_TOKEN", ""),
        ("BREZEL_SHARE_URL", "https://share.example.com"),
    ]
    .into_iter()
    .collect();
    let cfg = ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
    assert_eq!(cfg.api_url, "https://api.example.com");
    assert_eq!(cfg.system, "acme");
    assert_eq!(cfg.api_key.as_deref(), Some("k"));
    assert!(cfg.bearer_token.is_none());
    assert_eq!(cfg.share_url.as_deref(), Some("https://share.example.com"));
}

#[test]
fn from_lookup_requires_url_and_system() {
    let err = ClientConfig::from_lookup(|_| None).unwrap_err();
    assert!(matches!(err, ApiError::Config(ref m) if m.contains("BREZEL_API_URL")));

    let err = ClientConfig::from_lookup(|name| {
        (name == "BREZEL_API_URL").then(|| "https://api.example.com".to_string())
    })
    .unwrap_err();
    assert!(matches!(err, ApiError::Config(ref m) if m.contains("BREZEL_SYSTEM")));
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn validate_rejects_empty_system() {
    let err = ClientConfig::new("https://api.example.com", " ").validate().unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
}

#[test]
fn validate_rejects_bad_urls() {
    assert!(ClientConfig::new("not a url", "acme").validate().is_err());
    assert!(
        ClientConfig::new("https://api.example.com", "acme")
            .with_share_url("::")
            .validate()
            .is_err()
    );
    assert!(ClientConfig::new("https://api.example.com", "acme").validate().is_ok());
}

#[test]
fn client_new_validates_config() {
    let err = Client::new(ClientConfig::default()).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
}

// ── Auth selection ──────────────────────────────────────────────

#[test]
fn auth_prefers_api_key() {
    let cfg = ClientConfig::default().with_api_key("k").with_bearer_token("t");
    assert_eq!(cfg.auth(), Auth::ApiKey("k".into()));
    assert_eq!(cfg.auth().header(), Some(("X-API-Key", "k".to_string())));
}

#[test]
fn auth_falls_back_to_bearer() {
    let cfg = ClientConfig::default().with_bearer_token("t");
    assert_eq!(cfg.auth(), Auth::Bearer("t".into()));
    assert_eq!(
        cfg.auth().header(),
        Some(("Authorization", "Bearer t".to_string()))
    );
}

#[test]
fn auth_empty_key_counts_as_unset() {
    let cfg = ClientConfig::default().with_api_key("").with_bearer_token("t");
    assert_eq!(cfg.auth(), Auth::Bearer("t".into()));
    assert_eq!(ClientConfig::default().auth(), Auth::None);
    assert_eq!(Auth::None.header(), None);
}

#[test]
fn auth_debug_redacts() {
    assert_eq!(format!("{:?}", Auth::ApiKey("k".into())), "ApiKey(<redacted>)");
    assert_eq!(format!("{:?}", Auth::Bearer("t".into())), "Bearer(<redacted>)");
}

#[test]
fn client_debug_hides_secrets() {
    let client = Client::new(
        ClientConfig::new("https://api.example.com", "acme").with_api_key("super-secret"),
    )
    .unwrap();
    let debug = format!("{client:?}");
    assert!(debug.contains("acme"));
    assert!(!debug.contains("super-secret"));
}
