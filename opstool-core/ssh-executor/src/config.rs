//! SSH 配置

use std::time::Duration;

use opstool_common::ResourceConfig;
use secrecy::{Secret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SshError};

/// sudo 提示符为空时使用的标记
pub const DEFAULT_PROMPT_MARKER: &str = "[opstool-sudo-prompt]";

/// SSH 认证方式
///
/// 仅支持密码认证。
#[derive(Debug, Clone, Deserialize)]
pub enum AuthMethod {
    /// 密码认证（使用 Secret 包装，防止日志泄露）
    Password(SecretString),
}

impl AuthMethod {
    /// 获取密码
    pub fn password(&self) -> &SecretString {
        match self {
            Self::Password(password) => password,
        }
    }
}

/// 主机密钥校验策略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// 接受任意主机密钥（等同于 StrictHostKeyChecking=no）
    #[default]
    AcceptAny,
    /// 只接受列表中的 SHA256 指纹（形如 `SHA256:...`）
    Fingerprints(Vec<String>),
}

impl HostKeyPolicy {
    /// 判断指纹是否被接受
    pub fn accepts(&self, fingerprint: &str) -> bool {
        match self {
            Self::AcceptAny => true,
            Self::Fingerprints(allowed) => allowed.iter().any(|fp| fp.trim() == fingerprint),
        }
    }
}

/// sudo 密码写入方式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordInjection {
    /// 命令启动后立即写入密码，不等待提示符
    #[default]
    Immediate,
    /// 等待输出中出现提示标记后再写入密码
    OnPrompt { marker: String },
}

impl PasswordInjection {
    /// 使用默认标记的等待提示符模式
    pub fn on_prompt() -> Self {
        Self::OnPrompt {
            marker: DEFAULT_PROMPT_MARKER.to_string(),
        }
    }
}

/// 会话选项（与目标主机无关）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// 连接超时
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// 命令执行超时，`None` 表示不限制
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Option<Duration>,
    /// 主机密钥校验策略
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// sudo 密码写入方式
    #[serde(default)]
    pub password_injection: PasswordInjection,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            host_key_policy: HostKeyPolicy::default(),
            password_injection: PasswordInjection::default(),
        }
    }
}

/// SSH 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// 主机地址
    pub host: String,
    /// 端口（默认 22）
    #[serde(default = "default_port")]
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证方式
    pub auth: AuthMethod,
    /// 会话选项
    #[serde(flatten)]
    pub options: SessionOptions,
}

fn default_port() -> u16 {
    22
}

impl SshConfig {
    /// 使用密码认证创建配置
    ///
    /// # Arguments
    /// * `host` - 主机地址（前后空白会被去掉）
    /// * `username` - 用户名
    /// * `password` - 密码
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim().to_string(),
            port: default_port(),
            username: username.into(),
            auth: AuthMethod::Password(Secret::new(password.into())),
            options: SessionOptions::default(),
        }
    }

    /// 从资源配置创建
    ///
    /// 需要 `host`、`username`、`password` 属性；可选 `port`、
    /// `connect_timeout`、`command_timeout`（秒，0 表示不限制）、
    /// `host_fingerprints`（逗号分隔）、`sudo_prompt`（`immediate` 或提示标记）。
    pub fn from_resource(resource: &ResourceConfig) -> Result<Self> {
        let mut config = Self::with_password(
            resource.require("host")?,
            resource.require("username")?,
            resource.require("password")?,
        );

        if let Some(port) = resource.get_parsed::<u16>("port")? {
            config.port = port;
        }
        if let Some(secs) = resource.get_parsed::<u64>("connect_timeout")? {
            config.options.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = resource.get_parsed::<u64>("command_timeout")? {
            config.options.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(list) = resource.get("host_fingerprints") {
            let fingerprints: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|fp| !fp.is_empty())
                .map(str::to_string)
                .collect();
            if !fingerprints.is_empty() {
                config.options.host_key_policy = HostKeyPolicy::Fingerprints(fingerprints);
            }
        }
        if let Some(prompt) = resource.get("sudo_prompt") {
            config.options.password_injection = match prompt.trim() {
                "" | "immediate" => PasswordInjection::Immediate,
                marker => PasswordInjection::OnPrompt {
                    marker: marker.to_string(),
                },
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SshError::ConfigError("主机地址不能为空".to_string()));
        }
        if self.username.is_empty() {
            return Err(SshError::ConfigError("用户名不能为空".to_string()));
        }
        if self.port == 0 {
            return Err(SshError::ConfigError("端口不能为 0".to_string()));
        }
        if let PasswordInjection::OnPrompt { marker } = &self.options.password_injection {
            // sudo 会展开提示符中的 %u %h %p
            if marker.is_empty() || marker.contains('\'') || marker.contains('%') {
                return Err(SshError::ConfigError(format!("sudo 提示标记无效: {:?}", marker)));
            }
        }
        Ok(())
    }

    /// 设置端口
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// 设置命令执行超时
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// 设置主机密钥校验策略
    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.options.host_key_policy = policy;
        self
    }

    /// 设置 sudo 密码写入方式
    pub fn password_injection(mut self, injection: PasswordInjection) -> Self {
        self.options.password_injection = injection;
        self
    }

    /// 替换全部会话选项
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// 获取 SSH 地址字符串（host:port 格式）
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 日志用的目标描述（user@host:port）
    pub fn target(&self) -> String {
        format!("{}@{}", self.username, self.address())
    }
}
