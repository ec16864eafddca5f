use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 2;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

fn argon2() -> Result<Argon2<'static>> {
    let params: Params = ParamsBuilder::new()
        .m_cost(ARGON2_MEMORY_MB * 1024)
        .t_cost(ARGON2_ITERATIONS)
        .p_cost(ARGON2_PARALLELISM)
        .build()
        .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-formatted hash.
pub fn hash_password(password: &str) -> Result<String> {
    let password_bytes = Zeroizing::new(password.as_bytes().to_vec());
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2()?
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a PHC-formatted hash.
///
/// The parameters are read from the hash itself.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password_bytes = Zeroizing::new(password.as_bytes().to_vec());
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok())
}
