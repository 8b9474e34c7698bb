/// Tenant endpoints
///
/// # Endpoints
///
/// - `GET /api/tenants/domain/:domain` - Resolve a tenant before login (public)
/// - `POST /api/tenants` - Create a tenant (admin role)
/// - `GET /api/tenants/:id` - The caller's tenant
/// - `PUT /api/tenants/:id/settings` - Replace settings (admin)
/// - `DELETE /api/tenants/:id` - Delete the tenant and everything in it (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::context::ActorContext,
    models::{Features, Tenant, TenantSettings, Theme},
    usecase::tenant::{CreateTenantInput, UpdateTenantSettingsInput},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// `#` followed by 3, 4, 6, or 8 hex digits
pub(crate) fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .filter(|digits| matches!(digits.len(), 3 | 4 | 6 | 8))
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()));

    if valid {
        return Ok(());
    }

    let mut error = ValidationError::new("hexcolor");
    error.message = Some("Must be a hex color such as #1a2b3c".into());
    Err(error)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ThemeRequest {
    #[validate(custom(function = "validate_hex_color"))]
    pub primary_color: String,

    #[validate(custom(function = "validate_hex_color"))]
    pub secondary_color: String,
}

impl From<ThemeRequest> for Theme {
    fn from(theme: ThemeRequest) -> Self {
        Theme {
            primary_color: theme.primary_color,
            secondary_color: theme.secondary_color,
        }
    }
}

/// Create tenant request
///
/// New tenants start with every feature enabled.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 253, message = "Domain must be 1 to 253 characters"))]
    pub domain: String,

    #[validate(nested)]
    pub theme: ThemeRequest,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsRequest {
    #[validate(nested)]
    pub theme: ThemeRequest,

    pub features: Features,
}

/// Replace settings request; the whole settings document is required
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTenantSettingsRequest {
    #[validate(nested)]
    pub settings: SettingsRequest,
}

/// Resolve a tenant by its domain
///
/// # Errors
///
/// - `404 Not Found`: No tenant owns the domain
pub async fn get_tenant_by_domain(
    State(state): State<AppState>,
    ApiPath(domain): ApiPath<String>,
) -> ApiResult<Json<Tenant>> {
    let tenant = state.use_cases.get_tenant_by_domain().execute(&domain).await?;
    Ok(Json(tenant))
}

/// Create a tenant
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller is not an admin
/// - `409 Conflict`: Domain already taken
pub async fn create_tenant(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    req.validate()?;

    let tenant = state
        .use_cases
        .create_tenant()
        .execute(CreateTenantInput {
            name: req.name,
            domain: req.domain,
            theme: req.theme.into(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

/// Get the caller's tenant
///
/// # Errors
///
/// - `403 Forbidden`: The tenant is not the caller's
/// - `404 Not Found`: Unknown tenant
pub async fn get_tenant(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> ApiResult<Json<Tenant>> {
    let tenant = state.use_cases.get_tenant().execute(&actor, tenant_id).await?;
    Ok(Json(tenant))
}

/// Replace the tenant's settings
pub async fn update_tenant_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTenantSettingsRequest>,
) -> ApiResult<Json<Tenant>> {
    req.validate()?;

    let settings = TenantSettings {
        theme: req.settings.theme.into(),
        features: req.settings.features,
    };

    let tenant = state
        .use_cases
        .update_tenant_settings()
        .execute(&actor, UpdateTenantSettingsInput { tenant_id, settings })
        .await?;

    Ok(Json(tenant))
}

/// Delete the tenant with all of its users, knowledge, tags, and comments
pub async fn delete_tenant(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.use_cases.delete_tenant().execute(&actor, tenant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
