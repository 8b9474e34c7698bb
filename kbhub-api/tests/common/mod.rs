/// Common test utilities for integration tests
///
/// Builds the full router over the in-memory store, seeds a tenant, and
/// wraps request plumbing so tests read as HTTP conversations.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use kbhub_api::app::{build_router, AppState};
use kbhub_api::config::Config;
use kbhub_shared::auth::password::Argon2Hasher;
use kbhub_shared::models::{Tenant, Theme};
use kbhub_shared::repository::Repositories;
use kbhub_shared::usecase::tenant::CreateTenantInput;
use kbhub_shared::usecase::{UseCases, UuidGenerator};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
    pub tenant: Tenant,
}

/// Token and identity returned by register or login
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORAGE_BACKEND", "memory"),
        ("JWT_SECRET", "test-secret-that-is-at-least-32-characters"),
        ("PASSWORD_MEMORY_KIB", "8"),
        ("PASSWORD_ITERATIONS", "1"),
        ("PASSWORD_PARALLELISM", "1"),
    ]);

    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

impl TestContext {
    /// Fresh in-memory store with one tenant
    pub async fn new() -> Self {
        let config = test_config();
        let use_cases = UseCases::with_dependencies(
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::new(config.password)),
            Arc::new(UuidGenerator),
        );
        let state = AppState::new(use_cases, config);
        let app = build_router(state.clone());

        let tenant = Self::seed_tenant(&state, "acme.test").await;

        Self { app, state, tenant }
    }

    pub async fn seed_tenant(state: &AppState, domain: &str) -> Tenant {
        state
            .use_cases
            .create_tenant()
            .execute(CreateTenantInput {
                name: format!("Tenant {domain}"),
                domain: domain.to_string(),
                theme: Theme {
                    primary_color: "#112233".to_string(),
                    secondary_color: "#445566".to_string(),
                },
            })
            .await
            .expect("tenant is created")
    }

    /// Sends a request and returns the status with the decoded JSON body
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({status}): {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, value)
    }

    pub async fn register_in(&self, tenant_id: Uuid, email: &str, role: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "tenant_id": tenant_id,
                    "name": email.split('@').next().unwrap_or(email),
                    "email": email,
                    "password": PASSWORD,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        Session {
            token: body["token"].as_str().unwrap().to_string(),
            user_id: body["user_id"].as_str().unwrap().parse().unwrap(),
        }
    }

    pub async fn register(&self, email: &str, role: &str) -> Session {
        self.register_in(self.tenant.id, email, role).await
    }
}
