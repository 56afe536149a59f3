//! 字节数组与有符号十进制字符串互转
//!
//! 每个字节按有符号值输出，以单个空格分隔，如 `73 -113 78`。

use crate::error::{CryptoError, Result};

/// 字节数组转为有符号十进制字符串
pub fn bytes_to_signed_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| (*b as i8).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 解析有符号十进制字符串
///
/// 接受 -128..=255 范围内的值，空字符串返回空数组。
pub fn signed_string_to_bytes(text: &str) -> Result<Vec<u8>> {
    text.split_whitespace()
        .map(|token| match token.parse::<i16>() {
            Ok(v @ -128..=-1) => Ok(v as i8 as u8),
            Ok(v @ 0..=255) => Ok(v as u8),
            _ => Err(CryptoError::InvalidByteToken(token.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_format() {
        assert_eq!(bytes_to_signed_string(&[73, 143, 78, 3, 251]), "73 -113 78 3 -5");
        assert_eq!(bytes_to_signed_string(&[]), "");
    }

    #[test]
    fn test_parse_signed_and_unsigned() {
        assert_eq!(
            signed_string_to_bytes("73 -113 78 3 -5").unwrap(),
            vec![73, 143, 78, 3, 251]
        );
        assert_eq!(signed_string_to_bytes("143 255 -1").unwrap(), vec![143, 255, 255]);
        assert!(signed_string_to_bytes("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        for bad in ["256", "-129", "0x1f", "12a"] {
            let err = signed_string_to_bytes(&format!("1 {} 2", bad)).unwrap_err();
            assert!(matches!(err, CryptoError::InvalidByteToken(ref t) if t == bad), "{}", bad);
        }
    }

    #[test]
    fn test_ciphertext_survives_text_form() {
        let key = crate::generate_key();
        let data = crate::encrypt(&key, "hello").unwrap();
        let text = bytes_to_signed_string(&data);
        let parsed = signed_string_to_bytes(&text).unwrap();
        assert_eq!(crate::decrypt(&key, &parsed).unwrap(), "hello");
    }
}
