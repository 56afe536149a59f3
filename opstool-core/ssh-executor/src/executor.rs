//! 单次命令调用的执行流程
//!
//! 打开通道、按需申请伪终端、启动命令、写入 sudo 密码、读取输出直到通道关闭。
//! 无论成功还是失败，返回前都会关闭通道。

use std::time::Duration;

use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{PasswordInjection, SessionOptions};
use crate::error::{Result, SshError};
use crate::invocation::{CommandInvocation, InvocationState};
use crate::output::OutputAggregator;
use crate::result::ExecutionResult;
use crate::transport::{ChannelEvent, CommandChannel, RemoteSession};

/// 伪终端上的输入结束符 (Ctrl-D)
const END_OF_TRANSMISSION: u8 = 0x04;

/// 调用结束时的全部信息
#[derive(Debug)]
pub(crate) struct InvocationOutcome {
    pub error: Option<SshError>,
    pub state: InvocationState,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<u32>,
}

impl InvocationOutcome {
    /// 转换为不会失败的结果
    pub fn into_result(self) -> ExecutionResult {
        match self.error {
            None => ExecutionResult::success(self.stdout, self.stderr, self.exit_code),
            Some(err) => ExecutionResult::failure(&err, self.stdout, self.stderr, self.exit_code),
        }
    }

    /// 转换为带类型错误的结果
    pub fn into_typed(self) -> Result<ExecutionResult> {
        match self.error {
            None => Ok(ExecutionResult::success(self.stdout, self.stderr, self.exit_code)),
            Some(err) => Err(err),
        }
    }
}

/// 哪个输出流里出现了提示标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptStream {
    Stdout,
    Stderr,
}

/// 等待 sudo 提示符后再写入密码
#[derive(Debug)]
enum PromptWatch {
    /// 不需要等待
    Idle,
    /// 等待标记出现，两个输出流各自保留尾部
    Waiting {
        marker: String,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        secret: SecretString,
    },
    /// 已写入密码，结束时从输出中去掉标记
    Answered {
        marker: String,
        stream: PromptStream,
    },
}

impl PromptWatch {
    fn waiting(marker: &str, secret: &SecretString) -> Self {
        PromptWatch::Waiting {
            marker: marker.to_string(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            secret: secret.clone(),
        }
    }

    /// 检查新数据中是否出现标记，出现时返回要写入的密码
    fn observe(&mut self, stream: PromptStream, chunk: &[u8]) -> Option<SecretString> {
        let PromptWatch::Waiting {
            marker,
            stdout,
            stderr,
            secret,
        } = self
        else {
            return None;
        };

        let window = match stream {
            PromptStream::Stdout => stdout,
            PromptStream::Stderr => stderr,
        };
        window.extend_from_slice(chunk);

        let needle = marker.as_bytes();
        if needle.is_empty() || window.windows(needle.len()).any(|w| w == needle) {
            let secret = secret.clone();
            *self = PromptWatch::Answered {
                marker: std::mem::take(marker),
                stream,
            };
            return Some(secret);
        }

        // 只保留可能构成标记前缀的尾部
        let keep = needle.len().saturating_sub(1);
        if window.len() > keep {
            window.drain(..window.len() - keep);
        }
        None
    }

    fn strip(&self, stdout: &mut String, stderr: &mut String) {
        if let PromptWatch::Answered { marker, stream } = self {
            let text = match stream {
                PromptStream::Stdout => stdout,
                PromptStream::Stderr => stderr,
            };
            if let Some(pos) = text.find(marker.as_str()) {
                text.replace_range(pos..pos + marker.len(), "");
            }
        }
    }
}

/// 写入 sudo 密码并结束远端输入
///
/// 伪终端上的 EOT 让 sudo 在密码错误时放弃重试，直接退出。
async fn answer_prompt<C: CommandChannel>(channel: &mut C, secret: &SecretString) -> Result<()> {
    let line = Zeroizing::new(format!(
        "{}\n{}",
        secret.expose_secret(),
        END_OF_TRANSMISSION as char
    ));
    channel
        .write_stdin(line.as_bytes())
        .await
        .map_err(|e| SshError::EscalationError(e.to_string()))?;

    if let Err(e) = channel.close_stdin().await {
        debug!("关闭远端标准输入失败: {}", e);
    }
    debug!("已写入 sudo 密码");
    Ok(())
}

/// 单次调用
pub(crate) struct Invocation<'a, S: RemoteSession> {
    session: &'a S,
    invocation: &'a CommandInvocation,
    options: &'a SessionOptions,
    target: &'a str,
    channel: Option<S::Channel>,
    state: InvocationState,
    output: OutputAggregator,
    exit_code: Option<u32>,
    prompt: PromptWatch,
}

impl<'a, S: RemoteSession> Invocation<'a, S> {
    pub fn new(
        session: &'a S,
        invocation: &'a CommandInvocation,
        options: &'a SessionOptions,
        target: &'a str,
    ) -> Self {
        Self {
            session,
            invocation,
            options,
            target,
            channel: None,
            state: InvocationState::Idle,
            output: OutputAggregator::new(),
            exit_code: None,
            prompt: PromptWatch::Idle,
        }
    }

    /// 执行调用，超时或取消时强制关闭通道
    pub async fn run(mut self, cancel: &CancellationToken) -> InvocationOutcome {
        let limit = self.options.command_timeout;
        let result = tokio::select! {
            result = with_limit(limit, self.steps()) => result,
            _ = cancel.cancelled() => Err(SshError::Cancelled),
        };

        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("关闭通道失败（可能已由远端关闭）: {}", e);
            }
            debug!("通道已关闭: {}", self.target);
        }

        match &result {
            Ok(()) => self.transition(InvocationState::Closed),
            Err(err) => {
                warn!("命令执行失败 {}: {}", self.target, err);
                self.transition(InvocationState::Failed(err.kind()));
            }
        }

        let (mut stdout, mut stderr) = self.output.finish();
        self.prompt.strip(&mut stdout, &mut stderr);

        InvocationOutcome {
            error: result.err(),
            state: self.state,
            stdout,
            stderr,
            exit_code: self.exit_code,
        }
    }

    fn transition(&mut self, next: InvocationState) {
        if self.state.is_terminal() {
            return;
        }
        debug!("调用状态 {:?} -> {:?} ({})", self.state, next, self.target);
        self.state = next;
    }

    async fn steps(&mut self) -> Result<()> {
        let channel = self
            .session
            .open_channel()
            .await
            .map_err(|e| SshError::ChannelError(e.to_string()))?;
        let channel = self.channel.insert(channel);
        self.state = InvocationState::ChannelOpen;
        debug!("通道已打开: {}", self.target);

        let command = self.invocation.remote_command(&self.options.password_injection);

        if self.invocation.is_privileged() {
            channel
                .request_pty()
                .await
                .map_err(|e| SshError::ExecutionError(format!("申请伪终端失败: {}", e)))?;
        }

        channel
            .exec(&command)
            .await
            .map_err(|e| SshError::ExecutionError(e.to_string()))?;
        self.state = InvocationState::Connected;

        match self.invocation.credential() {
            None => {
                // 不转发本地输入
                if let Err(e) = channel.close_stdin().await {
                    debug!("关闭远端标准输入失败: {}", e);
                }
            }
            Some(credential) => match &self.options.password_injection {
                PasswordInjection::Immediate => answer_prompt(channel, credential).await?,
                PasswordInjection::OnPrompt { marker } => {
                    self.prompt = PromptWatch::waiting(marker, credential);
                }
            },
        }

        self.state = InvocationState::Draining;
        drain(
            channel,
            &mut self.output,
            &mut self.prompt,
            &mut self.exit_code,
        )
        .await
    }
}

/// 读取通道事件直到通道关闭
async fn drain<C: CommandChannel>(
    channel: &mut C,
    output: &mut OutputAggregator,
    prompt: &mut PromptWatch,
    exit_code: &mut Option<u32>,
) -> Result<()> {
    loop {
        let event = channel
            .next_event()
            .await
            .map_err(|e| SshError::StreamError(e.to_string()))?;

        let answer = match event {
            Some(ChannelEvent::Stdout(data)) => {
                output.push_stdout(&data);
                prompt.observe(PromptStream::Stdout, &data)
            }
            Some(ChannelEvent::Stderr(data)) => {
                output.push_stderr(&data);
                prompt.observe(PromptStream::Stderr, &data)
            }
            Some(ChannelEvent::ExitStatus(code)) => {
                *exit_code = Some(code);
                None
            }
            Some(ChannelEvent::Eof) => None,
            Some(ChannelEvent::Closed) | None => return Ok(()),
        };

        if let Some(secret) = answer {
            debug!("检测到 sudo 提示符");
            answer_prompt(channel, &secret).await?;
        }
    }
}

async fn with_limit<F>(limit: Option<Duration>, fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(SshError::TimeoutError(format!("超过 {:?} 未结束", limit)))),
        None => fut.await,
    }
}
