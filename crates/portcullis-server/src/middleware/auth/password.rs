//! Credential hashing (argon2id, PHC string format).

use crate::store::Password;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

/// Hashing failure. Only raised by [`hash_password`]; verification never
/// errors.
#[derive(Debug, thiserror::Error)]
#[error("failed to hash credential: {0}")]
pub struct HashError(String);

/// Hash `secret` with a fresh random salt.
pub fn hash_password(secret: &str) -> Result<Password, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| Password::from_hash(hash.to_string()))
        .map_err(|e| HashError(e.to_string()))
}

/// Compare `secret` against a stored hash. A stored form that does not parse
/// is treated as a mismatch.
pub fn verify_password(secret: &str, stored: &Password) -> bool {
    let Ok(parsed) = PasswordHash::new(stored.as_hash()) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

static DECOY: OnceLock<Password> = OnceLock::new();

fn decoy() -> &'static Password {
    DECOY.get_or_init(|| hash_password("portcullis-decoy-credential").unwrap_or_default())
}

/// Run a full verification against a fixed hash and discard the result.
/// Login paths that reject before reaching a real hash call this so that an
/// unknown or inactive account costs the same as a wrong password.
pub fn verify_against_decoy(secret: &str) {
    let _ = verify_password(secret, decoy());
}
