//! Password utilities

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

/// Generate a fresh random password
pub fn generate() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

/// Hash a password for storage
pub fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Valid hashed password")
        .to_string()
}

/// Check a password against a stored hash
pub fn verify(hashed_password: &str, password: &str) -> bool {
    let parsed_hash = PasswordHash::new(hashed_password).expect("Valid parsed hash");

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
