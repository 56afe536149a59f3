//! OpsTool SSH 执行器
//!
//! 提供 SSH 远程命令执行能力，支持：
//! - 密码认证，主机密钥校验可配置（默认不校验）
//! - 普通命令和 sudo 提权命令
//! - stdout / stderr 分别捕获，多字节字符跨块不丢失
//! - 命令超时和取消
//!
//! # 示例
//!
//! ```ignore
//! use opstool_ssh_executor::SshClient;
//!
//! let client = SshClient::new();
//! if client.login("192.168.1.100", 22, "root", "password").await {
//!     let result = client.execute("ls -la").await;
//!     println!("{}", result.stdout());
//!
//!     let result = client.execute_privileged("systemctl status nginx", "password").await;
//!     println!("{} {}", result.status(), result.stderr());
//! }
//! client.disconnect().await;
//! ```
//!
//! 注意：默认策略 [`HostKeyPolicy::AcceptAny`] 接受任意主机密钥，
//! 需要防止中间人攻击时请配置 [`HostKeyPolicy::Fingerprints`]。

mod client;
mod config;
mod error;
mod executor;
mod invocation;
mod output;
mod result;
mod ssh_transport;
mod transport;

pub use client::{SessionTarget, SshClient};
pub use config::{
    AuthMethod, HostKeyPolicy, PasswordInjection, SessionOptions, SshConfig,
    DEFAULT_PROMPT_MARKER,
};
pub use error::{FailureKind, Result, SshError};
pub use invocation::{CommandInvocation, ExecutionMode, InvocationState};
pub use output::{OutputAggregator, StreamDecoder};
pub use result::{
    ExecutionResult, Status, STATUS, STATUS_MESSAGE, STD_ERR, STD_OUT, SUCCESS_MESSAGE,
};
pub use ssh_transport::{HostKeyHandler, RusshChannel, RusshProvider, RusshSession};
pub use transport::{ChannelEvent, CommandChannel, RemoteSession, SessionProvider};

pub use tokio_util::sync::CancellationToken;
