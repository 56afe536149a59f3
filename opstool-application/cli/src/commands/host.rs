//! 资源管理命令

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config::CliConfig;
use crate::HostAction;

pub fn handle(action: HostAction, config_path: &Path) -> Result<()> {
    match action {
        HostAction::Add {
            name,
            host,
            port,
            username,
            password,
        } => add_host(config_path, &name, &host, port, &username, password),
        HostAction::List => list_hosts(config_path),
        HostAction::Remove { name } => remove_host(config_path, &name),
    }
}

fn add_host(
    config_path: &Path,
    name: &str,
    host: &str,
    port: u16,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let mut config = CliConfig::load(config_path)?;

    let mut attributes = BTreeMap::from([
        ("host".to_string(), host.trim().to_string()),
        ("port".to_string(), port.to_string()),
        ("username".to_string(), username.to_string()),
    ]);
    if let Some(password) = password {
        attributes.insert("password".to_string(), password);
    }

    config.add_resource(name, attributes)?;
    config.save(config_path)?;

    println!("{} 资源 {} 添加成功", "✓".green().bold(), name.cyan().bold());
    println!("  SSH:  {}", format!("{}@{}:{}", username, host.trim(), port).yellow());

    Ok(())
}

fn list_hosts(config_path: &Path) -> Result<()> {
    let config = CliConfig::load(config_path)?;

    if config.resources.is_empty() {
        println!("{}", "没有配置任何资源".yellow());
        println!("\n使用以下命令添加资源:");
        println!(
            "  {} opstool host add <NAME> <HOST> [-p <PORT>] [-u <USER>] [--password <PASSWORD>]",
            "$".bright_black()
        );
        return Ok(());
    }

    println!("{}\n", "配置的资源列表:".bold());

    for (name, attributes) in &config.resources {
        println!("{}", name.cyan().bold());

        let host = attributes.get("host").map(String::as_str).unwrap_or("-");
        let user = attributes.get("username").map(String::as_str).unwrap_or("-");
        let port = attributes.get("port").map(String::as_str).unwrap_or("22");
        println!("    SSH:  {}", format!("{}@{}:{}", user, host, port).bright_black());

        if attributes.contains_key("password") {
            println!("    密码: {}", "***".bright_black());
        }

        println!();
    }

    Ok(())
}

fn remove_host(config_path: &Path, name: &str) -> Result<()> {
    let mut config = CliConfig::load(config_path)?;

    match config.remove_resource(name) {
        Ok(()) => {
            config.save(config_path)?;
            println!("{} 资源 {} 已移除", "✓".green().bold(), name.cyan().bold());
        }
        Err(_) => {
            println!("{} 资源 {} 不存在", "✗".red().bold(), name);
        }
    }

    Ok(())
}
