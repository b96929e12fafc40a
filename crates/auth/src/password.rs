//! Password hashing (Argon2id, PHC strings) and reset-token generation.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use base64::Engine;
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Random bytes behind one reset token.
const RESET_TOKEN_BYTES: usize = 32;

const DECOY_SALT: &[u8; 16] = b"storefront-decoy";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("weak password: {0}")]
    Weak(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is unreadable: {0}")]
    CorruptHash(String),
}

/// Argon2id hashing with configurable cost.
///
/// Verification reads the parameters embedded in the stored PHC string, so
/// hashes written under older parameters keep verifying after a change.
#[derive(Debug, Clone)]
pub struct PasswordHashing {
    params: Params,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHashing {
    /// `m_cost` is in KiB, `t_cost` is the iteration count, `p_cost` the lanes.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Hashing(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let phc = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    /// `Ok(false)` on mismatch; `Err` only if the stored hash cannot be parsed.
    pub fn verify(&self, password: &str, phc: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(phc).map_err(|e| PasswordError::CorruptHash(e.to_string()))?;
        Ok(self.argon2().verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// A well-formed PHC string under the current parameters that no password
    /// matches. Verifying against it costs the same as a real check, and
    /// building it runs no hash.
    pub fn decoy_hash(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD_NO_PAD;
        format!(
            "$argon2id$v=19$m={},t={},p={}${}${}",
            self.params.m_cost(),
            self.params.t_cost(),
            self.params.p_cost(),
            b64.encode(DECOY_SALT),
            b64.encode([0u8; 32]),
        )
    }

    /// [`Self::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, password: &str) -> Result<String, PasswordError> {
        let hashing = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hashing.hash(&password))
            .await
            .map_err(|e| PasswordError::Hashing(format!("task join error: {e}")))?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(&self, password: &str, phc: &str) -> Result<bool, PasswordError> {
        let hashing = self.clone();
        let password = password.to_owned();
        let phc = phc.to_owned();
        tokio::task::spawn_blocking(move || hashing.verify(&password, &phc))
            .await
            .map_err(|e| PasswordError::Hashing(format!("task join error: {e}")))?
    }
}

pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Weak("password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::Weak(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// High-entropy, URL-safe, single-use reset token.
pub fn generate_reset_token() -> Result<String, PasswordError> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
