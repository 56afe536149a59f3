//! 远程命令执行

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use opstool_ssh_executor::{CommandInvocation, ExecutionResult, SshClient, SshConfig, Status};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::CliConfig;

/// 执行请求
pub struct ExecRequest {
    pub name: String,
    pub command: String,
    pub sudo_password: Option<String>,
    pub privileged: bool,
    pub timeout: Option<u64>,
    pub json: bool,
}

impl ExecRequest {
    fn invocation(&self, config: &SshConfig) -> CommandInvocation {
        if self.privileged {
            let password = self
                .sudo_password
                .as_deref()
                .unwrap_or_else(|| config.auth.password().expose_secret().as_str());
            CommandInvocation::privileged(&self.command, password)
        } else {
            CommandInvocation::plain(&self.command)
        }
    }
}

/// 执行命令，返回结果状态是否为 OK
pub async fn execute(request: ExecRequest, config_path: &Path) -> Result<bool> {
    let config = CliConfig::load(config_path)?;
    let mut ssh = config.ssh_config(&request.name)?;
    if let Some(secs) = request.timeout {
        ssh = ssh.command_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    let invocation = request.invocation(&ssh);
    let client = SshClient::new();

    let result = match client.try_connect(ssh).await {
        Ok(()) => {
            let result = client.run(&invocation).await;
            client.disconnect().await;
            result
        }
        Err(e) => ExecutionResult::from_error(&e),
    };

    info!("{} 执行结束: {}", request.name, result.status());

    if request.json {
        println!("{}", serde_json::to_string_pretty(&result.to_map())?);
    } else {
        print_result(&request.name, &result);
    }

    Ok(result.status() == Status::Ok)
}

/// 登录后立即断开
pub async fn check(name: &str, config_path: &Path) -> Result<bool> {
    let config = CliConfig::load(config_path)?;
    let ssh = config.ssh_config(name)?;
    let target = ssh.target();

    let client = SshClient::new();
    match client.try_connect(ssh).await {
        Ok(()) => {
            client.disconnect().await;
            println!("{} {} 登录成功", "✓".green().bold(), target.cyan());
            Ok(true)
        }
        Err(e) => {
            println!("{} {} 登录失败: {}", "✗".red().bold(), target.cyan(), e);
            Ok(false)
        }
    }
}

fn print_result(name: &str, result: &ExecutionResult) {
    match result.status() {
        Status::Ok => match result.exit_code() {
            Some(0) | None => {
                println!("{} {} 执行成功", "✓".green().bold(), name.cyan().bold())
            }
            Some(code) => println!(
                "{} {} 执行完成 (退出码: {})",
                "!".yellow().bold(),
                name.cyan().bold(),
                code
            ),
        },
        _ => println!(
            "{} {} 执行失败: {}",
            "✗".red().bold(),
            name.cyan().bold(),
            result.message().red()
        ),
    }

    if !result.stdout().is_empty() {
        println!("{}", "输出:".bright_black());
        for line in result.stdout().lines() {
            println!("  {}", line);
        }
    }

    if !result.stderr().is_empty() {
        println!("{}", "错误:".red());
        for line in result.stderr().lines() {
            println!("  {}", line.red());
        }
    }
}
