use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305, XNonce
};
use serde_derive::{Serialize, Deserialize};
use crate::base64;
use crate::errors::AppError;

#[derive(Serialize, Deserialize, Debug)]
pub struct EncryptedData {
    pub nonce: String,
    pub data: String,
}

#[derive(Clone)]
pub struct Encryption {
    cipher: XChaCha20Poly1305,
}

impl Encryption {
    /// Builds a cipher from a raw 32 byte key.
    pub fn new(key: &[u8]) -> Result<Encryption, AppError> {
        let cipher = XChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| AppError::UnexpectedError(format!("Encryption key must be 32 bytes, got {}", key.len())))?;

        Ok(Encryption { cipher })
    }

    /// Builds a cipher from a base64 (no padding) encoded key, the format stored in Secrets Manager.
    pub fn with(key_base64: &str) -> Result<Encryption, AppError> {
        let key = base64::decode_no_pad(key_base64.trim_end_matches('=').as_bytes())?;
        Encryption::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedData, AppError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng); // 192-bits; unique per message
        let ciphertext = self.cipher.encrypt(&nonce, plaintext.as_bytes())?;

        Ok(EncryptedData{
            nonce: base64::encode_no_pad(nonce.as_slice()),
            data: base64::encode_no_pad(&ciphertext),
        })
    }

    pub fn decrypt(&self, encrypted_data: &EncryptedData) -> Result<String, AppError> {
        let nonce_bytes = base64::decode_no_pad(encrypted_data.nonce.as_ref())?;
        let encrypted = base64::decode_no_pad(encrypted_data.data.as_ref())?;

        if nonce_bytes.len() != 24 {
            return Err(AppError::UnexpectedError(format!("Invalid nonce length {}", nonce_bytes.len())));
        }
        let nonce = XNonce::from_slice(nonce_bytes.as_slice());
        let plaintext = self.cipher.decrypt(nonce, encrypted.as_slice())?;

        String::from_utf8(plaintext).map_err(|_| AppError::UnexpectedError("Invalid UTF-8 sequence".to_string()))
    }

    /// Encrypts into the JSON string form kept in a single table attribute.
    pub fn seal(&self, plaintext: &str) -> Result<String, AppError> {
        Ok(serde_json::to_string(&self.encrypt(plaintext)?)?)
    }

    pub fn open(&self, sealed: &str) -> Result<String, AppError> {
        let encrypted: EncryptedData = serde_json::from_str(sealed)?;
        self.decrypt(&encrypted)
    }
}
