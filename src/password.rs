//! Trade password hashing
//!
//! Accounts store an explicit salt (`secret_key`) next to the Argon2 hash,
//! so verification is a deterministic recompute-and-compare against the
//! stored digest. Key material never leaves the account row.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, Salt, SaltString, rand_core::OsRng},
};

use crate::error::{PaymentError, Result};

/// Generate a fresh salt for a new account or a password reset.
pub fn generate_secret_key() -> String {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

/// Hash a plaintext trade password with the account's stored salt.
pub fn hash_password(password: &str, secret_key: &str) -> Result<String> {
    let salt = Salt::from_b64(secret_key)
        .map_err(|e| PaymentError::OperationFailed(format!("invalid secret key: {}", e)))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map_err(|e| PaymentError::OperationFailed(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Recompute the digest and compare with the stored one.
pub fn verify_password(password: &str, secret_key: &str, stored_hash: &str) -> Result<bool> {
    let computed = hash_password(password, secret_key)?;
    Ok(computed == stored_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let key = generate_secret_key();
        let h1 = hash_password("123456", &key).unwrap();
        let h2 = hash_password("123456", &key).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_salts_differ() {
        let k1 = generate_secret_key();
        let k2 = generate_secret_key();
        assert_ne!(k1, k2);
        let h1 = hash_password("123456", &k1).unwrap();
        let h2 = hash_password("123456", &k2).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_password() {
        let key = generate_secret_key();
        let hash = hash_password("s3cret", &key).unwrap();
        assert!(verify_password("s3cret", &key, &hash).unwrap());
        assert!(!verify_password("wrong", &key, &hash).unwrap());
    }

    #[test]
    fn test_bad_secret_key_rejected() {
        assert!(hash_password("pwd", "not a valid b64 salt!").is_err());
    }
}
