//! Note body encryption.
//!
//! # Responsibility
//! - Turn plaintext note bodies into sealed envelopes and back.
//!
//! # Invariants
//! - Sealed output always starts with [`CIPHERTEXT_PREFIX`] followed by
//!   base64 of an age x25519 payload.
//! - Opening anything without the prefix fails; plaintext is never echoed.

use crate::model::note::CIPHERTEXT_PREFIX;
use age::x25519::{Identity, Recipient};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::ExposeSecret;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Seals and opens note bodies.
pub trait ContentCipher {
    fn seal(&self, plaintext: &str) -> Result<String, CipherError>;
    fn open(&self, sealed: &str) -> Result<String, CipherError>;
}

#[derive(Debug)]
pub enum CipherError {
    InvalidKey,
    MissingEnvelope,
    Encoding(base64::DecodeError),
    Encrypt(String),
    Decrypt(String),
    NotUtf8,
}

impl Display for CipherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "invalid secret key"),
            Self::MissingEnvelope => write!(f, "content is not a sealed envelope"),
            Self::Encoding(err) => write!(f, "sealed envelope is not valid base64: {err}"),
            Self::Encrypt(message) => write!(f, "encryption failed: {message}"),
            Self::Decrypt(message) => write!(f, "decryption failed: {message}"),
            Self::NotUtf8 => write!(f, "decrypted content is not valid UTF-8"),
        }
    }
}

impl Error for CipherError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encoding(err) => Some(err),
            _ => None,
        }
    }
}

/// age x25519 cipher bound to one identity.
pub struct AgeCipher {
    identity: Identity,
    recipient: Recipient,
}

impl AgeCipher {
    /// Creates a cipher with a fresh key pair.
    pub fn generate() -> Self {
        let identity = Identity::generate();
        let recipient = identity.to_public();
        Self {
            identity,
            recipient,
        }
    }

    /// Restores a cipher from an `AGE-SECRET-KEY-1...` string.
    pub fn from_secret_key(secret: &str) -> Result<Self, CipherError> {
        let identity = Identity::from_str(secret.trim()).map_err(|_| CipherError::InvalidKey)?;
        let recipient = identity.to_public();
        Ok(Self {
            identity,
            recipient,
        })
    }

    /// Bech32 secret key, for the host app's keychain.
    pub fn secret_key(&self) -> String {
        self.identity.to_string().expose_secret().to_string()
    }
}

impl ContentCipher for AgeCipher {
    fn seal(&self, plaintext: &str) -> Result<String, CipherError> {
        let payload = age::encrypt(&self.recipient, plaintext.as_bytes())
            .map_err(|err| CipherError::Encrypt(err.to_string()))?;
        Ok(format!("{CIPHERTEXT_PREFIX}{}", STANDARD.encode(payload)))
    }

    fn open(&self, sealed: &str) -> Result<String, CipherError> {
        let encoded = sealed
            .strip_prefix(CIPHERTEXT_PREFIX)
            .ok_or(CipherError::MissingEnvelope)?;
        let payload = STANDARD.decode(encoded).map_err(CipherError::Encoding)?;
        let plaintext = age::decrypt(&self.identity, &payload)
            .map_err(|err| CipherError::Decrypt(err.to_string()))?;
        String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::{AgeCipher, CipherError, ContentCipher};
    use crate::model::note::{is_sealed, CIPHERTEXT_PREFIX};

    #[test]
    fn sealed_content_carries_envelope_and_hides_plaintext() {
        let cipher = AgeCipher::generate();
        let sealed = cipher.seal("meet at dawn").expect("seal should succeed");
        assert!(sealed.starts_with(CIPHERTEXT_PREFIX));
        assert!(is_sealed(&sealed));
        assert!(!sealed.contains("meet at dawn"));
        assert_eq!(cipher.open(&sealed).expect("open"), "meet at dawn");
    }

    #[test]
    fn restored_key_opens_previous_envelopes() {
        let cipher = AgeCipher::generate();
        let sealed = cipher.seal("secret").expect("seal");
        let restored = AgeCipher::from_secret_key(&cipher.secret_key()).expect("restore");
        assert_eq!(restored.open(&sealed).expect("open"), "secret");
    }

    #[test]
    fn other_key_cannot_open() {
        let sealed = AgeCipher::generate().seal("secret").expect("seal");
        let error = AgeCipher::generate()
            .open(&sealed)
            .expect_err("foreign key must fail");
        assert!(matches!(error, CipherError::Decrypt(_)));
    }

    #[test]
    fn plaintext_without_envelope_is_rejected() {
        let error = AgeCipher::generate()
            .open("hello")
            .expect_err("missing prefix must fail");
        assert!(matches!(error, CipherError::MissingEnvelope));
        assert!(matches!(
            AgeCipher::from_secret_key("nope"),
            Err(CipherError::InvalidKey)
        ));
    }
}
