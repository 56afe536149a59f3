//! OpsTool 加解密工具
//!
//! - 由口令和盐派生 256 位密钥 (Argon2id)
//! - ChaCha20-Poly1305 加解密字符串，密文格式为 `nonce || ciphertext || tag`
//! - 命名密钥集：加密使用最新版本的密钥，解密依次尝试各版本
//! - 字节数组与有符号十进制字符串（如 `73 -113 78`）互转

mod bytes;
mod cipher;
mod error;
mod keyring;

pub use bytes::{bytes_to_signed_string, signed_string_to_bytes};
pub use cipher::{
    decrypt, derive_key, encrypt, generate_key, Key, DEFAULT_PASSPHRASE, DEFAULT_SALT, KEY_LEN,
    NONCE_LEN, TAG_LEN,
};
pub use error::{CryptoError, Result};
pub use keyring::KeyRing;
