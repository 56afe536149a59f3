//! CLI 命令处理模块

pub mod exec;
pub mod host;
