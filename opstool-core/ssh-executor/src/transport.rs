//! 传输抽象
//!
//! 会话的建立和通道的收发由底层 SSH 库完成，执行器只通过这里的
//! trait 使用它们。

use async_trait::async_trait;

use crate::config::SshConfig;
use crate::error::Result;

/// 通道事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// 远端标准输出数据
    Stdout(Vec<u8>),
    /// 远端标准错误数据
    Stderr(Vec<u8>),
    /// 远端退出码
    ExitStatus(u32),
    /// 远端不再发送数据
    Eof,
    /// 通道已关闭
    Closed,
}

/// 会话提供者：根据配置建立已认证的会话
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: RemoteSession + 'static;

    /// 建立并认证会话
    async fn open(&self, config: &SshConfig) -> Result<Self::Session>;
}

/// 已建立的会话
#[async_trait]
pub trait RemoteSession: Send + Sync {
    type Channel: CommandChannel + 'static;

    /// 打开一个新的命令通道
    async fn open_channel(&self) -> Result<Self::Channel>;

    /// 会话是否仍然可用
    fn is_connected(&self) -> bool;

    /// 关闭会话
    async fn close(&self) -> Result<()>;
}

/// 单次命令通道
#[async_trait]
pub trait CommandChannel: Send {
    /// 请求伪终端
    async fn request_pty(&mut self) -> Result<()>;

    /// 启动命令
    async fn exec(&mut self, command: &str) -> Result<()>;

    /// 向远端标准输入写入数据
    async fn write_stdin(&mut self, data: &[u8]) -> Result<()>;

    /// 关闭远端标准输入
    async fn close_stdin(&mut self) -> Result<()>;

    /// 等待下一个事件，通道关闭后返回 `None`
    async fn next_event(&mut self) -> Result<Option<ChannelEvent>>;

    /// 关闭通道
    async fn close(&mut self) -> Result<()>;
}
