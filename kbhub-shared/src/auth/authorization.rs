/// Authorization checks
///
/// Pure functions over an [`ActorContext`]; the use cases call them after the
/// tenant has been verified and before any referenced entity is loaded.
///
/// # Permission Model
///
/// 1. **Tenant membership**: the actor's `tenant_id` must equal the target tenant
/// 2. **Role**: admins manage the tenant, its users, and any content
/// 3. **Authorship**: comment authors may edit and delete their own comments
///
/// # Example
///
/// ```
/// use kbhub_shared::auth::authorization::{require_admin, require_membership};
/// use kbhub_shared::auth::context::ActorContext;
/// use kbhub_shared::models::UserRole;
/// use uuid::Uuid;
///
/// let tenant_id = Uuid::new_v4();
/// let actor = ActorContext::new(Uuid::new_v4(), "ada@acme.test", UserRole::Admin, tenant_id);
///
/// assert!(require_membership(&actor, tenant_id).is_ok());
/// assert!(require_admin(&actor).is_ok());
/// assert!(require_membership(&actor, Uuid::new_v4()).is_err());
/// ```

use uuid::Uuid;

use super::context::ActorContext;
use crate::models::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// Actor belongs to another tenant
    #[error("Not a member of tenant {0}")]
    NotMember(Uuid),

    /// Actor lacks the required role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    /// Actor is neither the owner of the resource nor an admin
    #[error("Not authorized to modify this resource")]
    NotAuthorized,
}

/// Checks the actor belongs to `tenant_id`
pub fn require_membership(actor: &ActorContext, tenant_id: Uuid) -> Result<(), AuthzError> {
    if actor.tenant_id != tenant_id {
        return Err(AuthzError::NotMember(tenant_id));
    }

    Ok(())
}

/// Checks the actor is an admin of their tenant
pub fn require_admin(actor: &ActorContext) -> Result<(), AuthzError> {
    if !actor.is_admin() {
        return Err(AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: actor.role,
        });
    }

    Ok(())
}

/// Allows the author of a resource or an admin
///
/// A resource without an author can only be managed by admins.
pub fn require_author_or_admin(
    actor: &ActorContext,
    author_id: Option<Uuid>,
) -> Result<(), AuthzError> {
    if actor.is_admin() || author_id == Some(actor.user_id) {
        return Ok(());
    }

    Err(AuthzError::NotAuthorized)
}

/// Allows the user themself or an admin
pub fn require_self_or_admin(actor: &ActorContext, user_id: Uuid) -> Result<(), AuthzError> {
    require_author_or_admin(actor, Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole) -> ActorContext {
        ActorContext::new(Uuid::new_v4(), "someone@acme.test", role, Uuid::new_v4())
    }

    #[test]
    fn test_require_membership() {
        let a = actor(UserRole::Viewer);
        assert!(require_membership(&a, a.tenant_id).is_ok());

        let other = Uuid::new_v4();
        assert_eq!(require_membership(&a, other), Err(AuthzError::NotMember(other)));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&actor(UserRole::Admin)).is_ok());
        assert_eq!(
            require_admin(&actor(UserRole::Editor)),
            Err(AuthzError::InsufficientRole {
                required: UserRole::Admin,
                actual: UserRole::Editor,
            })
        );
    }

    #[test]
    fn test_require_author_or_admin() {
        let editor = actor(UserRole::Editor);
        assert!(require_author_or_admin(&editor, Some(editor.user_id)).is_ok());
        assert!(require_author_or_admin(&editor, Some(Uuid::new_v4())).is_err());
        assert!(require_author_or_admin(&editor, None).is_err());

        let admin = actor(UserRole::Admin);
        assert!(require_author_or_admin(&admin, Some(Uuid::new_v4())).is_ok());
        assert!(require_author_or_admin(&admin, None).is_ok());
    }

    #[test]
    fn test_require_self_or_admin() {
        let viewer = actor(UserRole::Viewer);
        assert!(require_self_or_admin(&viewer, viewer.user_id).is_ok());
        assert!(require_self_or_admin(&viewer, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::NotMember(Uuid::nil());
        assert!(err.to_string().contains("Not a member"));

        let err = AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: UserRole::Viewer,
        };
        assert_eq!(err.to_string(), "Insufficient permissions: requires admin, has viewer");
    }
}
