/// Password hashing using Argon2id
///
/// The use cases only see the [`PasswordHasher`] trait: `hash` turns a plaintext
/// password into a PHC string, `verify` checks a plaintext against one.
/// [`Argon2Hasher`] is the production implementation.
///
/// # Parameters
///
/// - **Memory**: 64 MB (65536 KiB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Parameters are embedded in every PHC string, so hashes created with
/// different [`PasswordParams`] still verify.
///
/// # Example
///
/// ```
/// use kbhub_shared::auth::password::{Argon2Hasher, PasswordHasher, PasswordParams};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::new(PasswordParams::default());
/// let hash = hasher.hash("super_secret_password_123")?;
///
/// assert!(hasher.verify(&hash, "super_secret_password_123")?);
/// assert!(!hasher.verify(&hash, "wrong_password")?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Invalid Argon2 parameters
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashing primitive consumed by the use cases
pub trait PasswordHasher: Send + Sync {
    /// Hashes `plaintext` into a self-describing digest
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// Returns `Ok(false)` for a wrong password, `Err` for a malformed digest
    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, PasswordError>;
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl PasswordParams {
    /// Cheapest parameters Argon2 accepts; for tests only
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Argon2id implementation of [`PasswordHasher`]
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: PasswordParams,
}

impl Argon2Hasher {
    pub fn new(params: PasswordParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> PasswordParams {
        self.params
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(self.params.memory_kib)
            .t_cost(self.params.iterations)
            .p_cost(self.params.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        // Cost parameters are read from the digest itself.
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Argon2Hasher {
        Argon2Hasher::new(PasswordParams::insecure_fast())
    }

    #[test]
    fn test_default_params() {
        let params = PasswordParams::default();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }

    #[test]
    fn test_hash_embeds_parameters() {
        let hash = fast().hash("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=8"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let hasher = fast();
        let first = hasher.hash("same_password").unwrap();
        let second = hasher.hash("same_password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let hasher = fast();
        let hash = hasher.hash("correct_password").unwrap();

        assert!(hasher.verify(&hash, "correct_password").unwrap());
        assert!(!hasher.verify(&hash, "wrong_password").unwrap());
        assert!(!hasher.verify(&hash, "").unwrap());
    }

    #[test]
    fn test_verify_across_parameter_sets() {
        let hash = fast().hash("portable").unwrap();
        let other = Argon2Hasher::new(PasswordParams {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        });
        assert!(other.verify(&hash, "portable").unwrap());
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(matches!(
            fast().verify("invalid_hash", "password"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_invalid_params_are_reported() {
        let hasher = Argon2Hasher::new(PasswordParams {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(
            hasher.hash("password"),
            Err(PasswordError::InvalidParams(_))
        ));
    }
}
