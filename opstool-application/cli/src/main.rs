//! OpsTool CLI 应用

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "opstool")]
#[command(about = "OpsTool - 远程主机命令执行工具", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// 配置文件路径 (默认 ~/.config/opstool/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 资源管理
    Host {
        #[command(subcommand)]
        action: HostAction,
    },

    /// 执行远程命令
    Exec {
        /// 资源名称
        name: String,
        /// 命令 (多条命令以换行分隔)
        command: String,
        /// 命令超时时间（秒，0 表示不限制）
        #[arg(short, long)]
        timeout: Option<u64>,
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },

    /// 通过 sudo 执行远程命令
    Sudo {
        /// 资源名称
        name: String,
        /// 命令 (不要包含 sudo)
        command: String,
        /// sudo 密码 (默认使用登录密码)
        #[arg(long)]
        sudo_password: Option<String>,
        /// 命令超时时间（秒，0 表示不限制）
        #[arg(short, long)]
        timeout: Option<u64>,
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },

    /// 检查能否登录
    Check {
        /// 资源名称
        name: String,
    },
}

#[derive(Subcommand)]
pub enum HostAction {
    /// 添加资源
    Add {
        /// 资源名称
        name: String,
        /// 主机地址
        host: String,
        /// SSH 端口
        #[arg(long, short = 'p', default_value = "22")]
        port: u16,
        /// SSH 用户名
        #[arg(long, short = 'u', default_value = "root")]
        username: String,
        /// SSH 密码
        #[arg(long)]
        password: Option<String>,
    },
    /// 列出资源
    List,
    /// 移除资源
    Remove { name: String },
}

fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<bool> {
    let config_path = config::CliConfig::resolve_path(cli.config.as_deref())?;
    debug!("配置文件: {:?}", config_path);

    match cli.command {
        Commands::Host { action } => {
            commands::host::handle(action, &config_path)?;
            Ok(true)
        }
        Commands::Exec {
            name,
            command,
            timeout,
            json,
        } => {
            let request = commands::exec::ExecRequest {
                name,
                command,
                sudo_password: None,
                privileged: false,
                timeout,
                json,
            };
            commands::exec::execute(request, &config_path).await
        }
        Commands::Sudo {
            name,
            command,
            sudo_password,
            timeout,
            json,
        } => {
            let request = commands::exec::ExecRequest {
                name,
                command,
                sudo_password,
                privileged: true,
                timeout,
                json,
            };
            commands::exec::execute(request, &config_path).await
        }
        Commands::Check { name } => commands::exec::check(&name, &config_path).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::from(2)
        }
    }
}
