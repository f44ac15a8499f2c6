//! Master password handling.
//!
//! A document never stores the master password itself. It stores a verifier:
//! the password encrypted under itself. Whoever can open the verifier with a
//! candidate password holds the right one.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use cfgvault_common::{Error, Result};
use cfgvault_crypto::CipherProvider;

/// Master password held in memory for the span of one operation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterPassword(String);

impl MasterPassword {
    /// Wrap a password.
    ///
    /// # Errors
    /// - Returns error if the password is empty
    pub fn new(password: impl Into<String>) -> Result<Self> {
        let password = password.into();
        if password.is_empty() {
            return Err(Error::Validation(
                "Master password cannot be empty".to_string(),
            ));
        }
        Ok(Self(password))
    }

    /// Borrow the password.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterPassword([REDACTED])")
    }
}

/// Produce the verifier stored alongside a document for `password`.
pub fn seal_verifier(cipher: &dyn CipherProvider, password: &MasterPassword) -> Result<String> {
    cipher.encrypt(password.expose(), password.expose())
}

/// Check a candidate password against a stored verifier.
pub fn verify_master_password(
    cipher: &dyn CipherProvider,
    verifier: &str,
    password: &MasterPassword,
) -> bool {
    match cipher.decrypt(verifier, password.expose()) {
        Ok(mut opened) => {
            let matches = opened == password.expose();
            opened.zeroize();
            matches
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgvault_crypto::{KdfParams, PasswordCipher};

    #[test]
    fn test_verifier_accepts_right_password() {
        let cipher = PasswordCipher::with_params(KdfParams::minimal());
        let pw = MasterPassword::new("hunter2").unwrap();
        let verifier = seal_verifier(&cipher, &pw).unwrap();

        assert!(!verifier.contains("hunter2"));
        assert!(verify_master_password(&cipher, &verifier, &pw));
    }

    #[test]
    fn test_verifier_rejects_wrong_password() {
        let cipher = PasswordCipher::with_params(KdfParams::minimal());
        let verifier = seal_verifier(&cipher, &MasterPassword::new("right").unwrap()).unwrap();

        let wrong = MasterPassword::new("wrong").unwrap();
        assert!(!verify_master_password(&cipher, &verifier, &wrong));
        assert!(!verify_master_password(&cipher, "garbage", &wrong));
    }

    #[test]
    fn test_empty_master_password_rejected() {
        assert!(matches!(MasterPassword::new(""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_debug_redacts() {
        let pw = MasterPassword::new("hunter2").unwrap();
        assert!(!format!("{:?}", pw).contains("hunter2"));
    }
}
