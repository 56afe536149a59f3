//! SSH 客户端实现
//!
//! 每个客户端最多持有一个会话，重新登录会先关闭旧会话。
//! 同一会话上的多次调用各自使用独立的通道，可以并发执行。

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{SessionOptions, SshConfig};
use crate::error::{Result, SshError};
use crate::executor::Invocation;
use crate::invocation::CommandInvocation;
use crate::result::ExecutionResult;
use crate::ssh_transport::RusshProvider;
use crate::transport::{RemoteSession, SessionProvider};

/// 会话目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl SessionTarget {
    fn from_config(config: &SshConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
        }
    }
}

impl std::fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// 当前会话
struct ActiveSession<S> {
    session: Arc<S>,
    target: SessionTarget,
    options: SessionOptions,
}

/// SSH 客户端
pub struct SshClient<P: SessionProvider = RusshProvider> {
    provider: P,
    defaults: SessionOptions,
    active: RwLock<Option<ActiveSession<P::Session>>>,
}

impl SshClient<RusshProvider> {
    /// 使用 russh 传输创建客户端
    pub fn new() -> Self {
        Self::with_provider(RusshProvider::new())
    }
}

impl Default for SshClient<RusshProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SessionProvider> SshClient<P> {
    /// 使用指定的会话提供者创建客户端
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            defaults: SessionOptions::default(),
            active: RwLock::new(None),
        }
    }

    /// 设置 `login` 使用的默认会话选项
    pub fn with_defaults(mut self, defaults: SessionOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// 使用密码登录
    ///
    /// 已有会话时先关闭。任何失败都返回 `false`，且不保留会话。
    pub async fn login(&self, host: &str, port: u16, username: &str, password: &str) -> bool {
        let config = SshConfig::with_password(host, username, password)
            .port(port)
            .options(self.defaults.clone());
        self.try_connect(config).await.is_ok()
    }

    /// 使用完整配置登录，返回具体错误
    pub async fn try_connect(&self, config: SshConfig) -> Result<()> {
        let mut active = self.active.write().await;

        if let Some(previous) = active.take() {
            close_session(previous).await;
        }

        config.validate()?;
        let target = SessionTarget::from_config(&config);
        debug!("尝试连接: {}", target);

        let opened = timeout(config.options.connect_timeout, self.provider.open(&config))
            .await
            .map_err(|_| {
                SshError::TimeoutError(format!(
                    "连接 {} 超过 {:?}",
                    target, config.options.connect_timeout
                ))
            })
            .and_then(|result| result);

        match opened {
            Ok(session) => {
                info!("SSH 连接成功: {}", target);
                *active = Some(ActiveSession {
                    session: Arc::new(session),
                    target,
                    options: config.options,
                });
                Ok(())
            }
            Err(e) => {
                error!("SSH 登录失败 {}: {}", target, e);
                Err(e)
            }
        }
    }

    /// 断开会话
    ///
    /// 没有会话或会话已关闭时什么也不做，可以重复调用。
    pub async fn disconnect(&self) {
        let previous = self.active.write().await.take();
        if let Some(previous) = previous {
            close_session(previous).await;
        }
    }

    /// 是否已连接
    pub async fn is_connected(&self) -> bool {
        self.active
            .read()
            .await
            .as_ref()
            .is_some_and(|active| active.session.is_connected())
    }

    /// 当前会话目标
    pub async fn target(&self) -> Option<SessionTarget> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|active| active.target.clone())
    }

    /// 执行普通命令（或多条以 `\n` 分隔的命令）
    pub async fn execute(&self, command: &str) -> ExecutionResult {
        self.run(&CommandInvocation::plain(command)).await
    }

    /// 通过 sudo 执行命令（不要在命令中再写 sudo）
    pub async fn execute_privileged(&self, command: &str, sudo_password: &str) -> ExecutionResult {
        self.run(&CommandInvocation::privileged(command, sudo_password))
            .await
    }

    /// 执行调用，失败时返回 KO 结果
    pub async fn run(&self, invocation: &CommandInvocation) -> ExecutionResult {
        self.run_with_cancel(invocation, &CancellationToken::new())
            .await
    }

    /// 执行调用，可通过取消令牌中止
    pub async fn run_with_cancel(
        &self,
        invocation: &CommandInvocation,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        match self.current().await {
            Ok((session, target, options)) => {
                let label = target.to_string();
                let outcome = Invocation::new(session.as_ref(), invocation, &options, &label)
                    .run(cancel)
                    .await;
                debug!("调用结束状态: {:?}", outcome.state);
                let result = outcome.into_result();
                if result.is_ok() {
                    info!("命令执行完成: {} (退出码 {:?})", label, result.exit_code());
                }
                result
            }
            Err(e) => {
                warn!("无法执行命令: {}", e);
                ExecutionResult::from_error(&e)
            }
        }
    }

    /// 执行调用，失败时返回具体错误
    pub async fn try_run(&self, invocation: &CommandInvocation) -> Result<ExecutionResult> {
        self.try_run_with_cancel(invocation, &CancellationToken::new())
            .await
    }

    /// 执行调用，失败时返回具体错误，可通过取消令牌中止
    pub async fn try_run_with_cancel(
        &self,
        invocation: &CommandInvocation,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        let (session, target, options) = self.current().await?;
        let label = target.to_string();
        Invocation::new(session.as_ref(), invocation, &options, &label)
            .run(cancel)
            .await
            .into_typed()
    }

    /// 执行命令并检查远端退出码
    pub async fn execute_checked(&self, command: &str) -> Result<ExecutionResult> {
        let result = self.try_run(&CommandInvocation::plain(command)).await?;

        if !result.is_success() {
            return Err(SshError::ExecutionError(format!(
                "命令执行失败 (退出码 {:?}): {}",
                result.exit_code(),
                if result.stderr().is_empty() {
                    result.stdout()
                } else {
                    result.stderr()
                }
            )));
        }

        Ok(result)
    }

    /// 获取当前会话的共享句柄
    async fn current(&self) -> Result<(Arc<P::Session>, SessionTarget, SessionOptions)> {
        let active = self.active.read().await;
        match active.as_ref() {
            Some(active) if active.session.is_connected() => Ok((
                Arc::clone(&active.session),
                active.target.clone(),
                active.options.clone(),
            )),
            _ => Err(SshError::NotConnected),
        }
    }
}

async fn close_session<S: RemoteSession>(active: ActiveSession<S>) {
    if !active.session.is_connected() {
        debug!("会话已关闭，无需断开: {}", active.target);
        return;
    }
    match active.session.close().await {
        Ok(()) => info!("会话已断开: {}", active.target),
        Err(e) => warn!("断开会话 {} 失败: {}", active.target, e),
    }
}
