//! SSH 错误定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SSH 操作结果类型
pub type Result<T> = std::result::Result<T, SshError>;

/// SSH 错误类型
#[derive(Error, Debug)]
pub enum SshError {
    /// 连接错误
    #[error("SSH 连接失败: {0}")]
    ConnectionError(String),

    /// 认证错误
    #[error("SSH 认证失败: {0}")]
    AuthenticationError(String),

    /// 主机密钥被拒绝
    #[error("主机密钥校验失败: {0}")]
    HostKeyRejected(String),

    /// 尚未登录
    #[error("SSH 会话未连接")]
    NotConnected,

    /// 通道错误
    #[error("SSH 通道打开失败: {0}")]
    ChannelError(String),

    /// 输出流读写错误
    #[error("SSH 通道 I/O 错误: {0}")]
    StreamError(String),

    /// 命令启动错误
    #[error("命令启动失败: {0}")]
    ExecutionError(String),

    /// sudo 密码写入错误
    #[error("sudo 密码写入失败: {0}")]
    EscalationError(String),

    /// 超时错误
    #[error("SSH 操作超时: {0}")]
    TimeoutError(String),

    /// 调用方取消
    #[error("命令执行已取消")]
    Cancelled,

    /// 协议层错误
    #[error("SSH 协议错误: {0}")]
    Protocol(#[from] russh::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// 失败原因分类，随 KO 结果一起返回给调用方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 登录阶段失败（网络、认证、主机密钥、配置）
    SessionFailed,
    NotConnected,
    ChannelOpenFailed,
    StreamIoFailed,
    ConnectFailed,
    EscalationWriteFailed,
    Timeout,
    Cancelled,
}

impl SshError {
    /// 错误对应的失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotConnected => FailureKind::NotConnected,
            Self::ChannelError(_) => FailureKind::ChannelOpenFailed,
            Self::StreamError(_) | Self::IoError(_) => FailureKind::StreamIoFailed,
            Self::ExecutionError(_) => FailureKind::ConnectFailed,
            Self::EscalationError(_) => FailureKind::EscalationWriteFailed,
            Self::TimeoutError(_) => FailureKind::Timeout,
            Self::Cancelled => FailureKind::Cancelled,
            Self::ConnectionError(_)
            | Self::AuthenticationError(_)
            | Self::HostKeyRejected(_)
            | Self::Protocol(_)
            | Self::ConfigError(_) => FailureKind::SessionFailed,
        }
    }
}

impl From<opstool_common::ResourceError> for SshError {
    fn from(err: opstool_common::ResourceError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(SshError::NotConnected.kind(), FailureKind::NotConnected);
        assert_eq!(
            SshError::ChannelError("refused".into()).kind(),
            FailureKind::ChannelOpenFailed
        );
        assert_eq!(
            SshError::TimeoutError("60s".into()).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            SshError::AuthenticationError("root".into()).kind(),
            FailureKind::SessionFailed
        );
    }

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::EscalationWriteFailed).unwrap();
        assert_eq!(json, "\"escalation_write_failed\"");
    }
}
