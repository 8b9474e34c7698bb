/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing behind the `PasswordHasher` trait
/// - [`jwt`]: HS256 access token creation and validation
/// - [`context`]: the authenticated actor handed to use cases
/// - [`authorization`]: membership, role, and authorship checks
///
/// # Example
///
/// ```
/// use kbhub_shared::auth::context::ActorContext;
/// use kbhub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use kbhub_shared::models::UserRole;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes";
/// let claims = Claims::new(Uuid::new_v4(), "ada@acme.test", UserRole::Admin, Uuid::new_v4(), Duration::hours(1));
/// let token = create_token(&claims, secret)?;
///
/// let actor = ActorContext::from(validate_token(&token, secret)?);
/// assert!(actor.is_admin());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod context;
pub mod jwt;
pub mod password;
