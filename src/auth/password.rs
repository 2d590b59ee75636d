//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Password hasher with configurable cost parameters
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with the argon2 crate's recommended parameters
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }

    /// Create hasher from security config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a self-salted PHC string
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::Hashing(e.to_string())
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// Malformed hashes verify as `false`; callers cannot tell them apart
    /// from a wrong password.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Failed to parse password hash: {:?}", e);
                return false;
            }
        };

        // Parameters are read from the PHC string, so hashes created under
        // older cost settings still verify.
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, config: &SecurityConfig) -> Result<(), AppError> {
        if password.chars().count() < config.password_min_length {
            return Err(AppError::Validation(format!(
                "password: must be at least {} characters",
                config.password_min_length
            )));
        }

        if password.trim().is_empty() {
            return Err(AppError::Validation("password: must not be blank".to_string()));
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher {
            argon2: Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(1024, 1, 1, None).unwrap(),
            ),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(!hasher.verify("secret2", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = fast_hasher();

        let hash1 = hasher.hash("secret1").unwrap();
        let hash2 = hasher.hash("secret1").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("secret1", &hash1));
        assert!(hasher.verify("secret1", &hash2));
    }

    #[test]
    fn test_malformed_hash_is_false_not_error() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("secret1", "not-a-phc-string"));
        assert!(!hasher.verify("secret1", ""));
        assert!(!hasher.verify("secret1", "$argon2id$v=19$m=1024,t=1,p=1$bad"));
    }

    #[test]
    fn test_verify_across_cost_settings() {
        let cheap = fast_hasher();
        let hash = cheap.hash("secret1").unwrap();

        // 默认参数的 hasher 仍能验证旧参数生成的哈希
        assert!(PasswordHasher::new().verify("secret1", &hash));
    }
}
