/// JWT authentication middleware
///
/// Validates the `Authorization: Bearer <token>` header and inserts the
/// resulting [`ActorContext`] into request extensions. Handlers behind this
/// layer extract it with `Extension<ActorContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use kbhub_api::{app::AppState, middleware::auth::jwt_auth};
/// use kbhub_shared::auth::context::ActorContext;
///
/// async fn whoami(Extension(actor): Extension<ActorContext>) -> String {
///     actor.email
/// }
///
/// # fn example(state: AppState) -> Router {
/// Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
///     .with_state(state)
/// # }
/// ```

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use kbhub_shared::auth::{context::ActorContext, jwt};

use crate::{app::AppState, error::ApiError};

/// Extracts the bearer token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Requires a valid access token
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;
    let actor = ActorContext::from(claims);

    tracing::debug!(user_id = %actor.user_id, tenant_id = %actor.tenant_id, "Authenticated request");

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// Requires the authenticated actor to hold the admin role
///
/// Must be layered inside [`jwt_auth`].
pub async fn require_admin_role(
    Extension(actor): Extension<ActorContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !actor.is_admin() {
        tracing::debug!(user_id = %actor.user_id, role = actor.role.as_str(), "Admin role required");
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}
