/// Classified use-case failures
///
/// Every use case returns [`AppError`]. Each variant carries a stable code
/// (see [`AppError::code`]) and belongs to one [`ErrorKind`], which the HTTP
/// layer maps to a status code.
///
/// # Example
///
/// ```
/// use kbhub_shared::error::{AppError, ErrorKind};
///
/// let err = AppError::missing_field("title");
/// assert_eq!(err.kind(), ErrorKind::InvalidInput);
/// assert_eq!(err.code(), "VALIDATION_ERROR");
/// ```

use serde::Serialize;
use thiserror::Error;

use crate::auth::authorization::AuthzError;
use crate::auth::password::PasswordError;
use crate::repository::{RepositoryError, TENANT_DOMAIN_KEY, USER_EMAIL_KEY};

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Infrastructure,
}

/// Field-level validation detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    InvalidInput {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("invalid role '{0}': expected admin, editor, or viewer")]
    InvalidRole(String),

    #[error("tenant not found")]
    TenantNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("knowledge not found")]
    KnowledgeNotFound,

    #[error("tag not found")]
    TagNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("email already exists in this tenant")]
    EmailAlreadyExists,

    #[error("tenant domain already exists")]
    DomainAlreadyExists,

    /// Unknown email and wrong password are deliberately indistinguishable
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage failure: {0}")]
    Infrastructure(#[source] RepositoryError),

    #[error("credential failure: {0}")]
    Credential(#[from] PasswordError),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A required field was absent or blank
    pub fn missing_field(field: &str) -> Self {
        AppError::InvalidInput {
            message: format!("{field} is required"),
            details: vec![FieldError::new(field, "is required")],
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput { .. } | AppError::InvalidRole(_) => ErrorKind::InvalidInput,
            AppError::TenantNotFound
            | AppError::UserNotFound
            | AppError::KnowledgeNotFound
            | AppError::TagNotFound
            | AppError::CommentNotFound => ErrorKind::NotFound,
            AppError::EmailAlreadyExists | AppError::DomainAlreadyExists => ErrorKind::Conflict,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Infrastructure(_) | AppError::Credential(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "VALIDATION_ERROR",
            AppError::InvalidRole(_) => "INVALID_ROLE",
            AppError::TenantNotFound => "TENANT_NOT_FOUND",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::KnowledgeNotFound => "KNOWLEDGE_NOT_FOUND",
            AppError::TagNotFound => "TAG_NOT_FOUND",
            AppError::CommentNotFound => "COMMENT_NOT_FOUND",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::DomainAlreadyExists => "DOMAIN_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Infrastructure(_) | AppError::Credential(_) => "INTERNAL_ERROR",
        }
    }

    /// Field details for validation failures
    pub fn details(&self) -> &[FieldError] {
        match self {
            AppError::InvalidInput { details, .. } => details,
            _ => &[],
        }
    }
}

impl From<RepositoryError> for AppError {
    /// Unique violations that slipped past a pre-check become conflicts
    fn from(err: RepositoryError) -> Self {
        match &err {
            RepositoryError::UniqueViolation(c) if c == TENANT_DOMAIN_KEY => {
                AppError::DomainAlreadyExists
            }
            RepositoryError::UniqueViolation(c) if c == USER_EMAIL_KEY => {
                AppError::EmailAlreadyExists
            }
            _ => AppError::Infrastructure(err),
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use uuid::Uuid;

    #[test]
    fn test_missing_field_details() {
        let err = AppError::missing_field("title");
        assert_eq!(err.to_string(), "title is required");
        assert_eq!(err.details(), &[FieldError::new("title", "is required")]);
    }

    #[test]
    fn test_kinds_and_codes() {
        let cases = [
            (AppError::invalid_input("bad"), ErrorKind::InvalidInput, "VALIDATION_ERROR"),
            (AppError::InvalidRole("owner".into()), ErrorKind::InvalidInput, "INVALID_ROLE"),
            (AppError::TenantNotFound, ErrorKind::NotFound, "TENANT_NOT_FOUND"),
            (AppError::CommentNotFound, ErrorKind::NotFound, "COMMENT_NOT_FOUND"),
            (AppError::EmailAlreadyExists, ErrorKind::Conflict, "EMAIL_ALREADY_EXISTS"),
            (AppError::DomainAlreadyExists, ErrorKind::Conflict, "DOMAIN_ALREADY_EXISTS"),
            (AppError::InvalidCredentials, ErrorKind::Unauthorized, "INVALID_CREDENTIALS"),
            (AppError::forbidden("no"), ErrorKind::Forbidden, "FORBIDDEN"),
            (
                AppError::Infrastructure(RepositoryError::NotFound),
                ErrorKind::Infrastructure,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, kind, code) in cases {
            assert_eq!(err.kind(), kind, "{err}");
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn test_unique_violations_become_conflicts() {
        let err = AppError::from(RepositoryError::UniqueViolation(TENANT_DOMAIN_KEY.into()));
        assert!(matches!(err, AppError::DomainAlreadyExists));

        let err = AppError::from(RepositoryError::UniqueViolation(USER_EMAIL_KEY.into()));
        assert!(matches!(err, AppError::EmailAlreadyExists));

        let err = AppError::from(RepositoryError::UniqueViolation("other_key".into()));
        assert!(matches!(err, AppError::Infrastructure(_)));
    }

    #[test]
    fn test_authz_errors_are_forbidden() {
        let err = AppError::from(AuthzError::NotMember(Uuid::nil()));
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = AppError::from(AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: UserRole::Editor,
        });
        assert!(err.to_string().contains("requires admin"));
    }
}
