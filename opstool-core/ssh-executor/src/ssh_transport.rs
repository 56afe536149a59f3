//! 基于 russh 的传输实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::keys::ssh_key::HashAlg;
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg, Disconnect};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::config::{HostKeyPolicy, SshConfig};
use crate::error::{Result, SshError};
use crate::transport::{ChannelEvent, CommandChannel, RemoteSession, SessionProvider};

/// stderr 在 SSH 扩展数据中的类型编号
const EXTENDED_DATA_STDERR: u32 = 1;

/// 主机密钥校验处理器
pub struct HostKeyHandler {
    target: String,
    policy: HostKeyPolicy,
}

impl client::Handler for HostKeyHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();

        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                debug!("未校验主机密钥 {} ({})", self.target, fingerprint);
                Ok(true)
            }
            policy if policy.accepts(&fingerprint) => {
                debug!("主机密钥校验通过 {} ({})", self.target, fingerprint);
                Ok(true)
            }
            _ => {
                warn!("主机密钥不在允许列表中 {} ({})", self.target, fingerprint);
                Err(SshError::HostKeyRejected(format!(
                    "{} 的指纹 {}",
                    self.target, fingerprint
                )))
            }
        }
    }
}

/// russh 会话提供者
pub struct RusshProvider {
    config: Arc<client::Config>,
}

impl RusshProvider {
    pub fn new() -> Self {
        let config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// 使用自定义的 russh 客户端配置
    pub fn with_config(config: client::Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for RusshProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for RusshProvider {
    type Session = RusshSession;

    async fn open(&self, config: &SshConfig) -> Result<RusshSession> {
        let target = config.target();
        let handler = HostKeyHandler {
            target: target.clone(),
            policy: config.options.host_key_policy.clone(),
        };

        let mut handle = client::connect(
            Arc::clone(&self.config),
            (config.host.as_str(), config.port),
            handler,
        )
        .await
        .map_err(|e| match e {
            SshError::Protocol(inner) => SshError::ConnectionError(format!("{}: {}", target, inner)),
            other => other,
        })?;

        debug!("SSH 握手完成: {}", target);

        let auth = handle
            .authenticate_password(&config.username, config.auth.password().expose_secret())
            .await
            .map_err(|e| SshError::AuthenticationError(format!("{}: {}", target, e)))?;

        if !auth.success() {
            return Err(SshError::AuthenticationError(format!(
                "{}: 用户名或密码错误",
                target
            )));
        }

        info!("SSH 认证成功: {}", target);
        Ok(RusshSession { handle, target })
    }
}

/// russh 会话
pub struct RusshSession {
    handle: Handle<HostKeyHandler>,
    target: String,
}

#[async_trait]
impl RemoteSession for RusshSession {
    type Channel = RusshChannel;

    async fn open_channel(&self) -> Result<RusshChannel> {
        let channel = self.handle.channel_open_session().await?;
        Ok(RusshChannel { channel })
    }

    fn is_connected(&self) -> bool {
        !self.handle.is_closed()
    }

    async fn close(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        debug!("SSH 会话已断开: {}", self.target);
        Ok(())
    }
}

/// russh 命令通道
pub struct RusshChannel {
    channel: Channel<Msg>,
}

#[async_trait]
impl CommandChannel for RusshChannel {
    async fn request_pty(&mut self) -> Result<()> {
        self.channel
            .request_pty(true, "xterm", 80, 24, 0, 0, &[])
            .await?;
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.channel.exec(true, command).await?;
        Ok(())
    }

    async fn write_stdin(&mut self, data: &[u8]) -> Result<()> {
        self.channel.data(data).await?;
        Ok(())
    }

    async fn close_stdin(&mut self) -> Result<()> {
        self.channel.eof().await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<ChannelEvent>> {
        loop {
            let event = match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => ChannelEvent::Stdout(data.to_vec()),
                Some(ChannelMsg::ExtendedData { data, ext }) if ext == EXTENDED_DATA_STDERR => {
                    ChannelEvent::Stderr(data.to_vec())
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => ChannelEvent::ExitStatus(exit_status),
                Some(ChannelMsg::Eof) => ChannelEvent::Eof,
                Some(ChannelMsg::Close) => ChannelEvent::Closed,
                Some(_) => continue,
                None => return Ok(None),
            };
            return Ok(Some(event));
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.channel.close().await?;
        Ok(())
    }
}
