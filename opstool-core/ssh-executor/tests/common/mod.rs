//! 测试用的脚本化传输

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use opstool_ssh_executor::{
    ChannelEvent, CommandChannel, RemoteSession, Result, SessionProvider, SshConfig, SshError,
};

/// 不可达的主机
pub const UNREACHABLE_HOST: &str = "unreachable.invalid";
/// 永远不响应握手的主机
pub const BLACKHOLE_HOST: &str = "blackhole.invalid";
/// 登录密码
pub const PASSWORD: &str = "secret";
/// 伪终端上的 Ctrl-D
pub const EOT: u8 = 0x04;

/// 记录传输层收到的调用
#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<String>,
    pub stdin: Vec<u8>,
    pub sessions: Vec<Arc<AtomicBool>>,
}

impl Journal {
    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }
}

/// sudo 行为脚本
///
/// 密码错误时输出 `retry` 后继续等待下一行，输入结束后输出 `gave_up`。
#[derive(Debug, Clone, Default)]
pub struct SudoScript {
    pub password: String,
    /// 等待密码前输出的事件
    pub prompt: Vec<ChannelEvent>,
    pub accepted: Vec<ChannelEvent>,
    pub retry: Vec<ChannelEvent>,
    pub gave_up: Vec<ChannelEvent>,
}

/// 通道行为脚本
#[derive(Debug, Clone, Default)]
pub struct ChannelScript {
    pub events: Vec<ChannelEvent>,
    pub fail_open_channel: bool,
    pub fail_exec: bool,
    pub fail_write: bool,
    /// 输出若干事件后读取失败
    pub stream_error_after: Option<usize>,
    /// 事件输出完后不关闭通道
    pub hang: bool,
    pub sudo: Option<SudoScript>,
}

impl ChannelScript {
    pub fn with_events(events: Vec<ChannelEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }
}

pub fn stdout(text: &str) -> ChannelEvent {
    ChannelEvent::Stdout(text.as_bytes().to_vec())
}

pub fn stderr(text: &str) -> ChannelEvent {
    ChannelEvent::Stderr(text.as_bytes().to_vec())
}

pub fn exit(code: u32) -> Vec<ChannelEvent> {
    vec![ChannelEvent::ExitStatus(code), ChannelEvent::Eof, ChannelEvent::Closed]
}

/// 脚本化的会话提供者
pub struct MockProvider {
    journal: Arc<Mutex<Journal>>,
    script: Arc<Mutex<ChannelScript>>,
}

impl MockProvider {
    pub fn new(script: ChannelScript) -> Self {
        Self {
            journal: Arc::new(Mutex::new(Journal::default())),
            script: Arc::new(Mutex::new(script)),
        }
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    pub fn script(&self) -> Arc<Mutex<ChannelScript>> {
        Arc::clone(&self.script)
    }
}

#[async_trait]
impl SessionProvider for MockProvider {
    type Session = MockSession;

    async fn open(&self, config: &SshConfig) -> Result<MockSession> {
        self.journal
            .lock()
            .unwrap()
            .events
            .push(format!("open {}", config.host));

        if config.host == UNREACHABLE_HOST {
            return Err(SshError::ConnectionError("No route to host".to_string()));
        }
        if config.host == BLACKHOLE_HOST {
            std::future::pending::<()>().await;
        }
        if config.auth.password().expose_secret() != PASSWORD {
            return Err(SshError::AuthenticationError("Permission denied".to_string()));
        }

        let alive = Arc::new(AtomicBool::new(true));
        self.journal
            .lock()
            .unwrap()
            .sessions
            .push(Arc::clone(&alive));

        Ok(MockSession {
            host: config.host.clone(),
            alive,
            journal: Arc::clone(&self.journal),
            script: Arc::clone(&self.script),
        })
    }
}

pub struct MockSession {
    host: String,
    alive: Arc<AtomicBool>,
    journal: Arc<Mutex<Journal>>,
    script: Arc<Mutex<ChannelScript>>,
}

#[async_trait]
impl RemoteSession for MockSession {
    type Channel = MockChannel;

    async fn open_channel(&self) -> Result<MockChannel> {
        self.journal.lock().unwrap().events.push("channel".to_string());
        let script = self.script.lock().unwrap().clone();
        if script.fail_open_channel {
            return Err(SshError::ChannelError("administratively prohibited".to_string()));
        }
        Ok(MockChannel::new(script, Arc::clone(&self.journal)))
    }

    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.alive.store(false, Ordering::SeqCst);
        self.journal
            .lock()
            .unwrap()
            .events
            .push(format!("close {}", self.host));
        Ok(())
    }
}

pub struct MockChannel {
    script: ChannelScript,
    queue: VecDeque<ChannelEvent>,
    journal: Arc<Mutex<Journal>>,
    served: usize,
    stdin: Vec<u8>,
    stdin_closed: bool,
    sudo_pending: bool,
}

impl MockChannel {
    fn new(script: ChannelScript, journal: Arc<Mutex<Journal>>) -> Self {
        let (queue, sudo_pending) = match &script.sudo {
            Some(sudo) => (sudo.prompt.iter().cloned().collect(), true),
            None => (script.events.iter().cloned().collect(), false),
        };
        Self {
            script,
            queue,
            journal,
            served: 0,
            stdin: Vec::new(),
            stdin_closed: false,
            sudo_pending,
        }
    }

    fn log(&self, event: impl Into<String>) {
        self.journal.lock().unwrap().events.push(event.into());
    }
}

#[async_trait]
impl CommandChannel for MockChannel {
    async fn request_pty(&mut self) -> Result<()> {
        self.log("pty");
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.log(format!("exec {}", command));
        if self.script.fail_exec {
            return Err(SshError::ExecutionError("exec request rejected".to_string()));
        }
        Ok(())
    }

    async fn write_stdin(&mut self, data: &[u8]) -> Result<()> {
        if self.script.fail_write {
            return Err(SshError::StreamError("broken pipe".to_string()));
        }
        self.log("stdin");
        self.stdin.extend_from_slice(data);
        self.journal.lock().unwrap().stdin.extend_from_slice(data);
        Ok(())
    }

    async fn close_stdin(&mut self) -> Result<()> {
        self.log("eof");
        self.stdin_closed = true;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<ChannelEvent>> {
        loop {
            if self.script.stream_error_after == Some(self.served) {
                return Err(SshError::StreamError("connection reset".to_string()));
            }

            if let Some(event) = self.queue.pop_front() {
                self.served += 1;
                return Ok(Some(event));
            }

            if self.sudo_pending {
                let Some(sudo) = self.script.sudo.clone() else {
                    return Ok(None);
                };
                if let Some(end) = self.stdin.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = self.stdin.drain(..=end).collect();
                    let given = String::from_utf8_lossy(&line[..end]).into_owned();
                    if given == sudo.password {
                        self.queue.extend(sudo.accepted);
                        self.queue.extend(self.script.events.iter().cloned());
                        self.sudo_pending = false;
                    } else {
                        self.queue.extend(sudo.retry);
                    }
                    continue;
                }
                if self.stdin_closed || self.stdin.first() == Some(&EOT) {
                    self.queue.extend(sudo.gave_up);
                    self.sudo_pending = false;
                    continue;
                }
                // 等待密码
                std::future::pending::<()>().await;
            }

            if self.script.hang {
                std::future::pending::<()>().await;
            }
            return Ok(None);
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log("channel-close");
        Ok(())
    }
}
