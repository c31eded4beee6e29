use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_never_the_plaintext() {
        let hash = hash_password("Secret#123").unwrap();
        assert_ne!(hash, "Secret#123");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("Secret#123").unwrap();
        assert!(verify_password("Secret#123", &hash).is_ok());
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("Secret#123").unwrap();
        assert!(verify_password("Secret#124", &hash).is_err());
    }
}
