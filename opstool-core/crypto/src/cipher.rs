//! 密钥派生与对称加密

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, KeyInit, Nonce};
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// 未指定盐时使用的默认值
pub const DEFAULT_SALT: &[u8] = b"Questo e' il salt associato alla chiave";
/// 未指定口令时使用的默认值
pub const DEFAULT_PASSPHRASE: &str = "Nel mezzo del cammin di nostra vita mi ritrovai per una selva oscura che la diritta via era smarrita.";

// Argon2id: 19 MiB, 2 轮, 单线程
const MEMORY_COST_KB: u32 = 19456;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

/// 对称密钥，离开作用域时清零
pub type Key = Zeroizing<[u8; KEY_LEN]>;

/// 由盐和口令派生密钥
///
/// 盐或口令为空（或未提供）时使用默认值。盐至少 8 字节。
pub fn derive_key(salt: Option<&[u8]>, passphrase: Option<&str>) -> Result<Key> {
    let salt = salt.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SALT);
    let passphrase = passphrase
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PASSPHRASE);

    let params = Params::new(MEMORY_COST_KB, ITERATIONS, PARALLELISM, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(key)
}

/// 生成随机密钥
pub fn generate_key() -> Key {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rand::rngs::OsRng.fill_bytes(&mut *key);
    key
}

/// 加密字符串，返回 `nonce || ciphertext || tag`
///
/// 每次加密使用新的随机 nonce，同一明文两次加密的结果不同。
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &str) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed)?;

    debug!("加密 {} 字节明文", plaintext.len());

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// 解密 [`encrypt`] 的输出
pub fn decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> Result<String> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::CiphertextTooShort(data.len()));
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    debug!("解密 {} 字节密文", data.len());

    Ok(String::from_utf8(plaintext)?)
}
