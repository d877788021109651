//! Argon2id password hashing.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use super::AuthError;

fn hasher(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

/// Hashes `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str, params: &Params) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Backend(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC string. Malformed hashes never match.
pub fn verify_password(hash: &str, password: &str, params: &Params) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    hasher(params)
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
