//! Password-based authenticated encryption into a self-describing JSON envelope.
//!
//! Wire format (all byte fields standard base64):
//!
//! ```json
//! {"kdf":"argon2id","salt":"...","cipher":"aes-256-gcm","nonce":"...","ciphertext":"..."}
//! ```
//!
//! `ciphertext` is the AES-256-GCM output with the 16-byte tag appended. The key is
//! derived with Argon2id using [`ENVELOPE_KDF_PARAMS`]; salt and nonce are fresh
//! per call.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::kdf::ENVELOPE_KDF_PARAMS;

pub const KDF_ARGON2ID: &str = "argon2id";
pub const CIPHER_AES_256_GCM: &str = "aes-256-gcm";
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Format(String),

    #[error("Unsupported envelope scheme: kdf={kdf}, cipher={cipher}")]
    UnsupportedScheme { kdf: String, cipher: String },

    /// Wrong secret and tampered content are deliberately the same variant.
    #[error("Envelope authentication failed")]
    Decryption,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed")]
    Encryption,
}

pub type EnvelopeResult<T> = std::result::Result<T, EnvelopeError>;

/// Serialized envelope. Byte fields are decoded on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub kdf: String,
    #[serde(with = "b64")]
    pub salt: Vec<u8>,
    pub cipher: String,
    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
}

mod b64 {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

fn cipher_for(secret: &str, salt: &[u8]) -> EnvelopeResult<Aes256Gcm> {
    let key = ENVELOPE_KDF_PARAMS
        .derive_key(secret.as_bytes(), salt)
        .map_err(|e| EnvelopeError::KeyDerivation(e.to_string()))?;

    // `key` is zeroed on drop regardless of which branch returns
    Aes256Gcm::new_from_slice(&key)
        .map_err(|_err| EnvelopeError::KeyDerivation("derived key has wrong length".to_string()))
}

/// ## Summary
/// Encrypts `plaintext` under a key derived from `secret` and returns the JSON envelope bytes.
///
/// ## Errors
/// Returns an error if key derivation, encryption, or serialization fails.
pub fn encrypt(secret: &str, plaintext: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let salt = random_bytes::<SALT_LEN>();
    let nonce = random_bytes::<NONCE_LEN>();

    let cipher = cipher_for(secret, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_err| EnvelopeError::Encryption)?;

    let envelope = EncryptedEnvelope {
        kdf: KDF_ARGON2ID.to_string(),
        salt: salt.to_vec(),
        cipher: CIPHER_AES_256_GCM.to_string(),
        nonce: nonce.to_vec(),
        ciphertext,
    };

    serde_json::to_vec(&envelope).map_err(|e| EnvelopeError::Format(e.to_string()))
}

/// ## Summary
/// Decrypts JSON envelope bytes produced by [`encrypt`] with the same `secret`.
///
/// ## Errors
/// - `Format` if the JSON, base64 fields, or field lengths are malformed
/// - `UnsupportedScheme` for an unknown `kdf` or `cipher` identifier
/// - `Decryption` for a wrong secret or any tampering
pub fn decrypt(secret: &str, envelope_bytes: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let envelope: EncryptedEnvelope = serde_json::from_slice(envelope_bytes)
        .map_err(|e| EnvelopeError::Format(e.to_string()))?;

    if envelope.kdf != KDF_ARGON2ID || envelope.cipher != CIPHER_AES_256_GCM {
        return Err(EnvelopeError::UnsupportedScheme {
            kdf: envelope.kdf,
            cipher: envelope.cipher,
        });
    }
    if envelope.salt.len() != SALT_LEN {
        return Err(EnvelopeError::Format(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            envelope.salt.len()
        )));
    }
    if envelope.nonce.len() != NONCE_LEN {
        return Err(EnvelopeError::Format(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            envelope.nonce.len()
        )));
    }

    let cipher = cipher_for(secret, &envelope.salt)?;
    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_err| EnvelopeError::Decryption)
}
