/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use kbhub_api::{app::AppState, config::Config};
/// use kbhub_shared::repository::Repositories;
/// use kbhub_shared::usecase::UseCases;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(UseCases::new(Repositories::in_memory()), config);
/// let app = kbhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use kbhub_shared::usecase::UseCases;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error::ApiError,
    middleware::auth::{jwt_auth, require_admin_role},
    routes,
};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Business operations over the configured store
    pub use_cases: UseCases,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(use_cases: UseCases, config: Config) -> Self {
        Self {
            use_cases,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Lifetime of issued access tokens
    pub fn token_lifetime(&self) -> Duration {
        Duration::hours(self.config.jwt.expiration_hours)
    }
}

/// Renders a handler panic as a classified 500 body
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::InternalError(format!("handler panicked: {detail}")).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  # Store ping (public)
/// └── /api/
///     ├── /auth/register, /auth/login          # public
///     ├── /tenants/domain/:domain              # public
///     ├── /auth/me                             # JWT
///     ├── /tenants, /tenants/:id[/settings]    # JWT (POST /tenants: admin role)
///     ├── /users, /users/:id                   # JWT
///     ├── /knowledge, /knowledge/:id           # JWT
///     ├── /knowledge/:id/comments[/:comment_id]# JWT
///     └── /tags, /tags/:id                     # JWT
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Panic recovery (tower-http CatchPanicLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route(
            "/tenants/domain/:domain",
            get(routes::tenants::get_tenant_by_domain),
        );

    // Tenant creation is gated on the admin role of the caller's token
    let admin_routes = Router::new()
        .route("/tenants", post(routes::tenants::create_tenant))
        .route_layer(middleware::from_fn(require_admin_role));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/tenants/:id",
            get(routes::tenants::get_tenant).delete(routes::tenants::delete_tenant),
        )
        .route(
            "/tenants/:id/settings",
            put(routes::tenants::update_tenant_settings),
        )
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/knowledge",
            post(routes::knowledge::create_knowledge).get(routes::knowledge::search_knowledge),
        )
        .route(
            "/knowledge/:id",
            get(routes::knowledge::get_knowledge)
                .put(routes::knowledge::update_knowledge)
                .delete(routes::knowledge::delete_knowledge),
        )
        .route(
            "/knowledge/:id/comments",
            post(routes::comments::create_comment).get(routes::comments::list_comments),
        )
        .route(
            "/knowledge/:id/comments/:comment_id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        .route(
            "/tags",
            post(routes::tags::create_tag).get(routes::tags::list_tags),
        )
        .route(
            "/tags/:id",
            put(routes::tags::update_tag).delete(routes::tags::delete_tag),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_is_rendered_as_internal_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
