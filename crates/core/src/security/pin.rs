use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

const MIN_PIN_LENGTH: usize = 4;
const MAX_PIN_LENGTH: usize = 8;

/// PINs are 4 to 8 ASCII digits.
pub fn validate_pin_format(pin: &str) -> Result<()> {
    let len = pin.len();
    if !(MIN_PIN_LENGTH..=MAX_PIN_LENGTH).contains(&len) || !pin.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::invalid_input(format!(
            "PIN must be {} to {} digits",
            MIN_PIN_LENGTH, MAX_PIN_LENGTH
        )));
    }
    Ok(())
}

/// Hashes a PIN into a PHC string (argon2id, random salt).
pub fn hash_pin(pin: &str) -> Result<String> {
    validate_pin_format(pin)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|err| Error::Security(format!("argon2 hash failed: {}", err)))?
        .to_string();
    Ok(hash)
}

/// Verifies a PIN against a stored PHC hash. A malformed hash is an error,
/// a wrong PIN is `Ok(false)`.
pub fn verify_pin(pin: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| Error::Security(format!("invalid stored PIN hash: {}", err)))?;
    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_pin("4821").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_pin("4821", &hash).expect("verify"));
        assert!(!verify_pin("4822", &hash).expect("verify"));
    }

    #[test]
    fn same_pin_hashes_differently() {
        assert_ne!(hash_pin("1234").unwrap(), hash_pin("1234").unwrap());
    }

    #[test]
    fn rejects_malformed_pins_and_hashes() {
        assert!(hash_pin("12").is_err());
        assert!(hash_pin("12ab").is_err());
        assert!(hash_pin("123456789").is_err());
        assert!(verify_pin("1234", "not-a-hash").is_err());
    }
}
