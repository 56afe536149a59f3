//! 命令执行结果

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, SshError};

/// 结果表中标准输出的键
pub const STD_OUT: &str = "out";
/// 结果表中标准错误的键
pub const STD_ERR: &str = "err";
/// 结果表中状态的键（OK / KO / 空）
pub const STATUS: &str = "status";
/// 结果表中状态说明的键
pub const STATUS_MESSAGE: &str = "message";
/// 成功时的状态说明
pub const SUCCESS_MESSAGE: &str = "0";

/// 执行状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
    /// 尚未产生结果
    #[default]
    #[serde(rename = "")]
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Ko => "KO",
            Self::Pending => "",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 命令执行结果
///
/// 每次调用只生成一次，返回后不再修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    status: Status,
    message: String,
    exit_code: Option<u32>,
    failure: Option<FailureKind>,
}

impl ExecutionResult {
    /// 成功结果
    pub(crate) fn success(stdout: String, stderr: String, exit_code: Option<u32>) -> Self {
        Self {
            stdout,
            stderr,
            status: Status::Ok,
            message: SUCCESS_MESSAGE.to_string(),
            exit_code,
            failure: None,
        }
    }

    /// 失败结果，保留已经读到的输出
    pub(crate) fn failure(
        error: &SshError,
        stdout: String,
        stderr: String,
        exit_code: Option<u32>,
    ) -> Self {
        Self {
            stdout,
            stderr,
            status: Status::Ko,
            message: error.to_string(),
            exit_code,
            failure: Some(error.kind()),
        }
    }

    /// 失败结果，输出为空
    pub fn from_error(error: &SshError) -> Self {
        Self::failure(error, String::new(), String::new(), None)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 远端命令的退出码（远端未上报时为 `None`）
    pub fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    /// 失败原因（仅 KO 时存在）
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    /// 传输层是否成功（不关心远端退出码）
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// 传输成功且远端退出码为 0
    pub fn is_success(&self) -> bool {
        self.is_ok() && self.exit_code.map_or(true, |code| code == 0)
    }

    /// 获取合并的输出（stdout + stderr）
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// 转换为四个键的结果表
    pub fn to_map(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (STD_OUT, self.stdout.clone()),
            (STD_ERR, self.stderr.clone()),
            (STATUS, self.status.as_str().to_string()),
            (STATUS_MESSAGE, self.message.clone()),
        ])
    }
}
