use thiserror::Error;

/// 加解密错误类型
#[derive(Error, Debug)]
pub enum CryptoError {
    /// 密钥派生失败（如盐太短）
    #[error("密钥派生失败: {0}")]
    KeyDerivation(String),

    #[error("密钥无效: {0}")]
    InvalidKey(String),

    #[error("加密失败")]
    EncryptionFailed,

    /// 密钥不匹配或密文被篡改
    #[error("解密失败")]
    DecryptionFailed,

    #[error("密文长度不足: {0} 字节")]
    CiphertextTooShort(usize),

    #[error("解密结果不是 UTF-8 文本: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("密钥集不存在: {0}")]
    KeySetNotFound(String),

    #[error("字节字符串格式错误: {0}")]
    InvalidByteToken(String),

    #[error("密钥集文件解析失败: {0}")]
    KeyRingFile(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
