//! Shared helpers for the integration tests
//!
//! Builds the full router over a [`MemoryStore`] with a stub geocoder and
//! a mailer that records every message instead of sending it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    async_trait,
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use hirafic_backend::{
    config::{
        AuthConfig, Config, DatabaseConfig, GeocoderConfig, JwtConfig, MailConfig, SearchConfig,
        ServerConfig, StorageBackend,
    },
    create_app,
    error::{AppError, AppResult},
    external::{EmailMessage, Geocoder, Mailer},
    models::GpsCoordinates,
    store::MemoryStore,
    AppState,
};

pub const DEFAULT_POSITION: GpsCoordinates = GpsCoordinates {
    latitude: 12.34,
    longitude: 56.78,
};

/// Geocoder answering from a fixed table, falling back to
/// [`DEFAULT_POSITION`]
#[derive(Default)]
pub struct StubGeocoder {
    places: Mutex<HashMap<String, GpsCoordinates>>,
    unknown: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn place(&self, location: &str, coordinates: GpsCoordinates) {
        self.places
            .lock()
            .unwrap()
            .insert(location.to_string(), coordinates);
    }

    /// Make `location` resolve to no match at all
    pub fn forget(&self, location: &str) {
        self.unknown.lock().unwrap().insert(location.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, location: &str) -> AppResult<GpsCoordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if location.trim().is_empty() {
            return Err(AppError::InvalidInput("Location must not be empty".to_string()));
        }
        if self.unknown.lock().unwrap().contains(location) {
            return Err(AppError::NotFound(format!(
                "Coordinates for location '{}'",
                location
            )));
        }
        Ok(self
            .places
            .lock()
            .unwrap()
            .get(location)
            .copied()
            .unwrap_or(DEFAULT_POSITION))
    }
}

/// Mailer that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait for background deliveries to reach `count` messages
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        },
        auth: AuthConfig {
            password_hash_cost: 4,
        },
        geocoder: GeocoderConfig {
            base_url: "http://127.0.0.1:9/search".to_string(),
            user_agent: "Hirafic_Project/1.0".to_string(),
            timeout_secs: 1,
        },
        mail: MailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            username: String::new(),
            password: String::new(),
            from_address: "noreply@hirafic.test".to_string(),
            operations_mailbox: "ops@hirafic.test".to_string(),
            timeout_secs: 1,
        },
        search: SearchConfig {
            default_radius_km: 5.0,
            default_per_page: 10,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub geocoder: Arc<StubGeocoder>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let geocoder = Arc::new(StubGeocoder::default());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState {
            store: store.clone(),
            geocoder: geocoder.clone(),
            mailer: mailer.clone(),
            config: Arc::new(test_config()),
        };

        Self {
            router: create_app(state),
            store,
            geocoder,
            mailer,
        }
    }

    /// Send one request through the router and decode the JSON reply
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, role: &str, location: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                    "confirm_password": "password123",
                    "phone_number": "0555 123 456",
                    "location": location,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        body
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(json!({
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register and log in, returning the bearer token
    pub async fn sign_up(&self, username: &str, role: &str, location: &str) -> String {
        self.register(username, role, location).await;
        self.login(username).await
    }
}

/// `completion_date` string `days` from now (negative for the past)
pub fn completion_in_days(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
