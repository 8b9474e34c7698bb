/// Authenticated actor context
///
/// Produced by token verification at the HTTP boundary and passed explicitly to
/// every use case that acts on behalf of a caller. The use cases trust these
/// fields once handed to them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub tenant_id: Uuid,
}

impl ActorContext {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: UserRole, tenant_id: Uuid) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            tenant_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for ActorContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            tenant_id: claims.tenant_id,
        }
    }
}
