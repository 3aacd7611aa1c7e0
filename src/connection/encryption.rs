//! # Collector Message Encryption
//!
//! AES-256 in CBC mode. Each message gets a random 16-byte IV that is
//! prepended to the ciphertext. The plaintext is padded with spaces to the
//! next 16-byte boundary (a whole block of spaces when it is already
//! aligned) and trailing spaces are trimmed after decryption, so messages
//! must not end in a meaningful space. JSON never does.

use aes::Aes256;
use cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES block and IV size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_SIZE: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid data length: must be an IV plus a multiple of {block_size}, got {actual}")]
    InvalidDataLength { block_size: usize, actual: usize },
}

/// A 256-bit collector key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    key: [u8; KEY_SIZE],
}

impl AesKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(AesKey { key })
    }

    /// Parses a key written as 64 hex digits.
    pub fn from_hex(text: &str) -> Result<Self, crate::error::RadarError> {
        let bytes = hex::decode(text.trim())?;
        Ok(Self::from_bytes(&bytes)?)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// Encrypts with a fresh random IV.
pub fn encrypt(key: &AesKey, plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; BLOCK_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    encrypt_with_iv(key, &iv, plaintext)
}

/// Encrypts with a caller-chosen IV. Returns `iv ++ ciphertext`.
pub fn encrypt_with_iv(key: &AesKey, iv: &[u8; BLOCK_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256::new(GenericArray::from_slice(key.as_bytes()));

    let mut padded = plaintext.to_vec();
    let padding = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
    padded.resize(plaintext.len() + padding, b' ');

    let mut out = Vec::with_capacity(BLOCK_SIZE + padded.len());
    out.extend_from_slice(iv);

    let mut prev = *iv;
    for chunk in padded.chunks_exact(BLOCK_SIZE) {
        let mut block = aes::Block::clone_from_slice(chunk);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        out.extend_from_slice(&block);
    }
    out
}

/// Splits off the IV, decrypts and trims the space padding.
pub fn decrypt(key: &AesKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < BLOCK_SIZE || (data.len() - BLOCK_SIZE) % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidDataLength {
            block_size: BLOCK_SIZE,
            actual: data.len(),
        });
    }

    let cipher = Aes256::new(GenericArray::from_slice(key.as_bytes()));
    let (iv, ciphertext) = data.split_at(BLOCK_SIZE);

    let mut out = Vec::with_capacity(ciphertext.len());
    let mut prev = [0u8; BLOCK_SIZE];
    prev.copy_from_slice(iv);
    for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut block = aes::Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        out.extend_from_slice(&block);
        prev.copy_from_slice(chunk);
    }

    let trimmed = out.iter().rposition(|b| *b != b' ').map_or(0, |i| i + 1);
    out.truncate(trimmed);
    Ok(out)
}
