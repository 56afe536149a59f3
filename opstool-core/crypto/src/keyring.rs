//! 命名密钥集
//!
//! **文件格式**: TOML，每个密钥集按版本从旧到新列出 base64 编码的 32 字节密钥
//!
//! ```toml
//! [keysets.app]
//! keys = ["<v1>", "<v2>"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::cipher::{self, Key, KEY_LEN};
use crate::error::{CryptoError, Result};

#[derive(Deserialize)]
struct KeyRingFile {
    #[serde(default)]
    keysets: BTreeMap<String, KeySetEntry>,
}

#[derive(Deserialize)]
struct KeySetEntry {
    keys: Vec<String>,
}

/// 命名密钥集合
#[derive(Default)]
pub struct KeyRing {
    keysets: BTreeMap<String, Vec<Key>>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions: BTreeMap<&str, usize> = self
            .keysets
            .iter()
            .map(|(name, keys)| (name.as_str(), keys.len()))
            .collect();
        f.debug_struct("KeyRing").field("keysets", &versions).finish()
    }
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: KeyRingFile =
            toml::from_str(content).map_err(|e| CryptoError::KeyRingFile(e.to_string()))?;

        let mut ring = Self::new();
        for (name, entry) in file.keysets {
            for encoded in entry.keys {
                ring.add_key(&name, decode_key(&name, &encoded)?);
            }
        }
        Ok(ring)
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = Zeroizing::new(std::fs::read_to_string(path)?);
        let ring = Self::from_toml_str(&content)?;
        info!("加载密钥集文件 {:?}: {} 个密钥集", path, ring.keysets.len());
        Ok(ring)
    }

    /// 追加一个新版本的密钥
    pub fn add_key(&mut self, keyset: &str, key: Key) {
        self.keysets.entry(keyset.to_string()).or_default().push(key);
    }

    /// 生成新版本的密钥并返回版本号（从 1 开始）
    pub fn rotate(&mut self, keyset: &str) -> usize {
        self.add_key(keyset, cipher::generate_key());
        let version = self.versions(keyset);
        info!("密钥集 {} 轮换到版本 {}", keyset, version);
        version
    }

    /// 密钥集的版本数，不存在时为 0
    pub fn versions(&self, keyset: &str) -> usize {
        self.keysets.get(keyset).map_or(0, Vec::len)
    }

    fn keys(&self, keyset: &str) -> Result<&[Key]> {
        self.keysets
            .get(keyset)
            .filter(|keys| !keys.is_empty())
            .map(Vec::as_slice)
            .ok_or_else(|| CryptoError::KeySetNotFound(keyset.to_string()))
    }

    /// 使用最新版本的密钥加密
    pub fn encrypt(&self, keyset: &str, plaintext: &str) -> Result<Vec<u8>> {
        let keys = self.keys(keyset)?;
        let latest = &keys[keys.len() - 1];
        cipher::encrypt(latest, plaintext)
    }

    /// 从最新版本开始逐个尝试解密
    pub fn decrypt(&self, keyset: &str, data: &[u8]) -> Result<String> {
        let keys = self.keys(keyset)?;
        for (index, key) in keys.iter().enumerate().rev() {
            match cipher::decrypt(key, data) {
                Ok(text) => {
                    debug!("密钥集 {} 版本 {} 解密成功", keyset, index + 1);
                    return Ok(text);
                }
                Err(CryptoError::DecryptionFailed) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(CryptoError::DecryptionFailed)
    }
}

fn decode_key(keyset: &str, encoded: &str) -> Result<Key> {
    let raw = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("{}: {}", keyset, e)))?,
    );
    if raw.len() != KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "{}: 密钥长度为 {} 字节, 应为 {}",
            keyset,
            raw.len(),
            KEY_LEN
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&raw);
    Ok(key)
}
