//! Password hashing (argon2, PHC string format).

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Stored passwords starting with this marker never verify.
const UNUSABLE_PASSWORD_PREFIX: char = '!';

pub(crate) fn hash_password(raw: &str) -> ResultEngine<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

/// Value stored for identities created without a password.
pub(crate) fn unusable_password() -> String {
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", Uuid::new_v4().simple())
}

/// Hash `raw` or fall back to an unusable password when none was supplied.
pub(crate) fn password_for_storage(raw: Option<&str>) -> ResultEngine<String> {
    match raw {
        Some("") => Err(EngineError::invalid("password", "This field may not be blank.")),
        Some(raw) => hash_password(raw),
        None => Ok(unusable_password()),
    }
}

pub(crate) fn verify_password(raw: &str, stored: &str) -> bool {
    if stored.starts_with(UNUSABLE_PASSWORD_PREFIX) {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("s3cret").unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("wrong", &stored));
    }

    #[test]
    fn unusable_password_never_verifies() {
        let stored = password_for_storage(None).unwrap();
        assert!(!verify_password("", &stored));
        assert!(!verify_password(&stored, &stored));
    }

    #[test]
    fn blank_password_is_rejected() {
        let err = password_for_storage(Some("")).unwrap_err();
        assert_eq!(err.field(), Some("password"));
    }
}
