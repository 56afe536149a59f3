//! 命令调用描述

use secrecy::{Secret, SecretString};

use crate::config::PasswordInjection;
use crate::error::FailureKind;

/// 执行模式
#[derive(Debug, Clone)]
pub enum ExecutionMode {
    /// 普通执行
    Plain,
    /// 通过 sudo 提权执行
    Privileged { credential: SecretString },
}

/// 一次命令调用，创建后不可修改
///
/// 命令可以是多条以 `\n` 连接的命令，由远端 shell 作为一次调用执行。
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    command: String,
    mode: ExecutionMode,
}

impl CommandInvocation {
    /// 普通命令
    pub fn plain(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            mode: ExecutionMode::Plain,
        }
    }

    /// sudo 命令（不要在命令中再写 sudo）
    pub fn privileged(command: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            mode: ExecutionMode::Privileged {
                credential: Secret::new(credential.into()),
            },
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self.mode, ExecutionMode::Privileged { .. })
    }

    pub(crate) fn credential(&self) -> Option<&SecretString> {
        match &self.mode {
            ExecutionMode::Plain => None,
            ExecutionMode::Privileged { credential } => Some(credential),
        }
    }

    /// 实际发送到远端的命令
    ///
    /// 提权模式下改写为 `sudo -S -p '<提示符>' <命令>`，立即写入模式的提示符为空。
    pub fn remote_command(&self, injection: &PasswordInjection) -> String {
        match (&self.mode, injection) {
            (ExecutionMode::Plain, _) => self.command.clone(),
            (ExecutionMode::Privileged { .. }, PasswordInjection::Immediate) => {
                format!("sudo -S -p '' {}", self.command)
            }
            (ExecutionMode::Privileged { .. }, PasswordInjection::OnPrompt { marker }) => {
                format!("sudo -S -p '{}' {}", marker, self.command)
            }
        }
    }
}

/// 单次调用的状态机
///
/// `Idle -> ChannelOpen -> Connected -> Draining -> Closed`，
/// 任意一步失败直接进入 `Failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    ChannelOpen,
    Connected,
    Draining,
    Closed,
    Failed(FailureKind),
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}
