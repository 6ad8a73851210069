#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use oficina_api::{config::AppConfig, db, dto::clients::ClienteRequest, AppState};
use sea_orm::ConnectionTrait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use unicode_normalization::UnicodeNormalization;

const BOUNDARY: &str = "----oficina-test-boundary";

/// ASCII mailbox name derived from a client name: "Mário Lopes" -> "mario.lopes".
pub fn email_local_part(nome: &str) -> String {
    nome.to_lowercase()
        .nfd()
        .filter_map(|c| match c {
            ' ' => Some('.'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

/// A part of a multipart request body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        file_name: &'a str,
        data: &'a [u8],
    },
}

/// Helper harness for spinning up an application backed by a temporary
/// SQLite database and upload directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("oficina_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_081,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.upload_dir = dir.path().join("uploads").to_string_lossy().into_owned();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = oficina_api::app_router(state.clone());

        Self { router, state, dir }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.config.upload_path()
    }

    /// Number of files currently stored in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Send a request with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("build request")).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    /// Send a `multipart/form-data` request.
    pub async fn multipart(&self, method: Method, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    field,
                    file_name,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .expect("build multipart request");
        self.send(request).await
    }

    /// Makes every insert into `table` fail, to exercise rollbacks.
    pub async fn fail_inserts_into(&self, table: &str) {
        self.state
            .db
            .execute_unprepared(&format!(
                "CREATE TRIGGER fail_{table} BEFORE INSERT ON {table} \
                 BEGIN SELECT RAISE(ABORT, 'insert into {table} refused'); END"
            ))
            .await
            .expect("install failing trigger");
    }

    /// Inserts a client through the service layer and returns its id.
    pub async fn seed_client(&self, nome: &str) -> i32 {
        self.state
            .services
            .clients
            .create_client(ClienteRequest {
                nome: nome.to_string(),
                telefone: Some("(11) 99999-0000".to_string()),
                email: Some(format!("{}@example.com", email_local_part(nome))),
                endereco: Some("Rua das Flores, 10".to_string()),
                cidade: Some("São Paulo".to_string()),
            })
            .await
            .expect("seed client")
            .id
    }

    /// Creates an order through the API and returns the created row.
    pub async fn create_order(&self, payload: Value) -> Value {
        let (status, body) = self.request(Method::POST, "/api/ordens", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body["data"].clone()
    }

    /// Minimal valid order payload for `cliente_id`.
    pub fn order_payload(cliente_id: i32) -> Value {
        json!({
            "cliente_id": cliente_id,
            "equipamento": "iPhone 11",
            "defeito": "Tela quebrada"
        })
    }
}
