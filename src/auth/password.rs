use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tracing::error;

const UNUSABLE_SECRET_LEN: usize = 48;

fn argon2_failure(op: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(error = %e, op, "argon2 failure");
    anyhow::anyhow!("argon2 {} failed: {}", op, e)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| argon2_failure("hash", e))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| argon2_failure("parse", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon2_failure("verify", e)),
    }
}

/// Hash of a random secret nobody knows; used for accounts that only sign in
/// through Google.
pub fn unusable_password_hash() -> anyhow::Result<String> {
    let secret: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(UNUSABLE_SECRET_LEN)
        .map(char::from)
        .collect();
    hash_password(&secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_password_verifies() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("hunter22").unwrap(), hash_password("hunter22").unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-in-db").is_err());
    }

    #[test]
    fn unusable_hash_is_a_valid_argon2_hash() {
        let hash = unusable_password_hash().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!verify_password("", &hash).unwrap());
    }
}
