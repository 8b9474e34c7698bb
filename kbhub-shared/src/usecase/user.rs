/// User use cases
///
/// Registration and authentication are public: they run before the caller
/// holds a token. Everything else acts on behalf of an [`ActorContext`].
///
/// Passwords never leave this module in plaintext; they are hashed through the
/// injected [`PasswordHasher`] before reaching a repository.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    load_tenant, now, or_not_found, require_id, require_present_text, require_text, IdGenerator,
};
use crate::auth::authorization::{require_admin, require_membership, require_self_or_admin};
use crate::auth::context::ActorContext;
use crate::auth::password::PasswordHasher;
use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::repository::Repositories;

fn parse_role(role: &str) -> Result<UserRole, AppError> {
    UserRole::from_str(role).ok_or_else(|| {
        debug!(role, "Rejected unknown role");
        AppError::InvalidRole(role.to_string())
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserInput {
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub struct RegisterUser {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
    ids: Arc<dyn IdGenerator>,
}

impl RegisterUser {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { repos, hasher, ids }
    }

    /// Registers a user in a tenant
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank name, email, password, or tenant ID
    /// - `InvalidRole` when `role` is not admin, editor, or viewer
    /// - `TenantNotFound`
    /// - `EmailAlreadyExists` when the email is taken within this tenant
    pub async fn execute(&self, input: RegisterUserInput) -> Result<User, AppError> {
        require_text("name", &input.name)?;
        require_text("email", &input.email)?;
        require_text("password", &input.password)?;
        require_id("tenant_id", input.tenant_id)?;
        let role = parse_role(&input.role)?;

        load_tenant(&self.repos, input.tenant_id).await?;

        if self
            .repos
            .users
            .find_by_email(&input.email, input.tenant_id)
            .await?
            .is_some()
        {
            debug!(tenant_id = %input.tenant_id, "Email already registered");
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(&input.password)?;

        let timestamp = now();
        let user = User {
            id: self.ids.generate(),
            tenant_id: input.tenant_id,
            name: input.name,
            email: input.email,
            password_hash,
            avatar_url: input.avatar_url.filter(|url| !url.trim().is_empty()),
            role,
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.repos.users.create(&user).await?;

        info!(
            tenant_id = %user.tenant_id,
            user_id = %user.id,
            role = user.role.as_str(),
            "Registered user"
        );

        Ok(user)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateUserInput {
    pub tenant_id: Uuid,
    pub email: String,
    pub password: String,
}

pub struct AuthenticateUser {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthenticateUser {
    pub fn new(repos: Repositories, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repos, hasher }
    }

    /// Checks a user's credentials and returns the user
    ///
    /// An unknown email and a wrong password both fail with
    /// `InvalidCredentials`.
    pub async fn execute(&self, input: AuthenticateUserInput) -> Result<User, AppError> {
        require_text("email", &input.email)?;
        require_text("password", &input.password)?;
        require_id("tenant_id", input.tenant_id)?;

        load_tenant(&self.repos, input.tenant_id).await?;

        let Some(user) = self
            .repos
            .users
            .find_by_email(&input.email, input.tenant_id)
            .await?
        else {
            debug!(tenant_id = %input.tenant_id, "Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        match self.hasher.verify(&user.password_hash, &input.password) {
            Ok(true) => {
                info!(tenant_id = %user.tenant_id, user_id = %user.id, "User authenticated");
                Ok(user)
            }
            Ok(false) => {
                debug!(tenant_id = %user.tenant_id, user_id = %user.id, "Wrong password");
                Err(AppError::InvalidCredentials)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}

pub struct GetUser {
    repos: Repositories,
}

impl GetUser {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Any member of the tenant may read another member's profile
    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<User, AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("user_id", user_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        self.repos
            .users
            .find_by_id(user_id, tenant_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}

pub struct ListUsers {
    repos: Repositories,
}

impl ListUsers {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(&self, actor: &ActorContext, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        require_id("tenant_id", tenant_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;
        require_admin(actor)?;

        Ok(self.repos.users.find_all(tenant_id).await?)
    }
}

/// Partial user update
///
/// `None` leaves a field unchanged. `avatar_url: Some(None)` clears the avatar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub role: Option<String>,
}

pub struct UpdateUser {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
}

impl UpdateUser {
    pub fn new(repos: Repositories, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repos, hasher }
    }

    /// Updates a user; the user themself or an admin
    ///
    /// # Errors
    ///
    /// - `Forbidden` when a non-admin edits someone else or changes a role
    /// - `EmailAlreadyExists` when the new email belongs to another user of
    ///   the tenant
    pub async fn execute(&self, actor: &ActorContext, input: UpdateUserInput) -> Result<User, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_id("user_id", input.user_id)?;
        require_present_text("name", input.name.as_ref())?;
        require_present_text("email", input.email.as_ref())?;
        require_present_text("password", input.password.as_ref())?;
        let role = input.role.as_deref().map(parse_role).transpose()?;

        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;
        require_self_or_admin(actor, input.user_id)?;
        if role.is_some() {
            require_admin(actor)?;
        }

        let mut user = self
            .repos
            .users
            .find_by_id(input.user_id, input.tenant_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(email) = input.email {
            if email != user.email {
                let taken = self
                    .repos
                    .users
                    .find_by_email(&email, input.tenant_id)
                    .await?
                    .is_some_and(|other| other.id != user.id);
                if taken {
                    debug!(tenant_id = %input.tenant_id, user_id = %user.id, "Email already in use");
                    return Err(AppError::EmailAlreadyExists);
                }
                user.email = email;
            }
        }

        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(password) = input.password {
            user.password_hash = self.hasher.hash(&password)?;
        }
        if let Some(avatar_url) = input.avatar_url {
            user.avatar_url = avatar_url.filter(|url| !url.trim().is_empty());
        }
        if let Some(role) = role {
            user.role = role;
        }
        user.updated_at = now();

        self.repos
            .users
            .update(&user)
            .await
            .map_err(or_not_found(AppError::UserNotFound))?;

        info!(tenant_id = %user.tenant_id, user_id = %user.id, actor_id = %actor.user_id, "Updated user");

        Ok(user)
    }
}

/// Deletes a user, keeping their content with the author cleared; admins only
pub struct DeleteUser {
    repos: Repositories,
}

impl DeleteUser {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("user_id", user_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;
        require_admin(actor)?;

        if self.repos.users.find_by_id(user_id, tenant_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        self.repos
            .users
            .delete(user_id, tenant_id)
            .await
            .map_err(or_not_found(AppError::UserNotFound))?;

        info!(tenant_id = %tenant_id, user_id = %user_id, actor_id = %actor.user_id, "Deleted user");

        Ok(())
    }
}
