// Cryptographic helpers for sealing the session document at rest

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Arguments
///
/// * `data` - The data to encrypt (must implement Serialize)
/// * `key` - The encryption key (must be 32 bytes for AES-256)
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let json_data = serde_json::to_vec(data).context("Failed to serialize data")?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_slice())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    // nonce || ciphertext
    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails (wrong key or tampered data)
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data.trim())
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    serde_json::from_slice(&plaintext).context("Failed to deserialize data from decrypted JSON")
}

/// Derive a 32-byte AES-256 key from arbitrary key material
///
/// Operator-supplied secrets come in any length and shape (passphrases,
/// base64 blobs), so the material is hashed with SHA-256 rather than padded.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let digest = Sha256::digest(input_key);
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    encryption_key.copy_from_slice(&digest);
    encryption_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Payload {
        token: String,
        count: u32,
    }

    fn payload() -> Payload {
        Payload {
            token: "tok1".to_string(),
            count: 3,
        }
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let key = derive_encryption_key(b"correct horse battery staple");
        let sealed = encrypt_data(&payload(), &key).unwrap();

        assert!(!sealed.contains("tok1"));
        let opened: Payload = decrypt_data(&sealed, &key).unwrap();
        assert_eq!(opened, payload());
    }

    #[test]
    fn test_nonce_makes_ciphertexts_differ() {
        let key = derive_encryption_key(b"k");
        let first = encrypt_data(&payload(), &key).unwrap();
        let second = encrypt_data(&payload(), &key).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt_data(&payload(), &derive_encryption_key(b"one")).unwrap();
        let result: Result<Payload> = decrypt_data(&sealed, &derive_encryption_key(b"two"));
        assert!(result.unwrap_err().to_string().contains("AES decryption failed"));
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        let result = encrypt_data(&payload(), b"short");
        assert!(result.unwrap_err().to_string().contains("Invalid key length"));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let key = derive_encryption_key(b"k");
        let result: Result<Payload> = decrypt_data("AAAA", &key);
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_encryption_key(b"secret"), derive_encryption_key(b"secret"));
        assert_ne!(derive_encryption_key(b"secret"), derive_encryption_key(b"secret2"));
    }
}
