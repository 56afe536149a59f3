//! CLI 配置管理
//!
//! **数据存储方式**: TOML 文件 (~/.config/opstool/config.toml)
//!
//! 每个资源是 `[resources.<name>]` 下的一组字符串属性，
//! 与容器中的资源引用一一对应。

use anyhow::{Context, Result};
use opstool_common::{ResourceConfigFactory, ResourceReference};
use opstool_ssh_executor::SshConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// 配置版本
    #[serde(default = "default_version")]
    pub version: String,

    /// 资源列表
    #[serde(default)]
    pub resources: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            resources: BTreeMap::new(),
        }
    }
}

impl CliConfig {
    /// 获取默认配置文件路径
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("无法获取用户配置目录")?;
        Ok(config_dir.join("opstool").join("config.toml"))
    }

    /// 解析配置文件路径
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// 加载配置，文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("读取配置文件失败: {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("序列化配置失败")?;

        fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;

        Ok(())
    }

    /// 添加资源
    pub fn add_resource(&mut self, name: &str, attributes: BTreeMap<String, String>) -> Result<()> {
        if self.resources.contains_key(name) {
            anyhow::bail!("资源 {} 已存在", name);
        }

        self.resources.insert(name.to_string(), attributes);
        Ok(())
    }

    /// 移除资源
    pub fn remove_resource(&mut self, name: &str) -> Result<()> {
        if self.resources.remove(name).is_none() {
            anyhow::bail!("资源 {} 不存在", name);
        }
        Ok(())
    }

    /// 获取资源属性
    pub fn get_resource(&self, name: &str) -> Result<&BTreeMap<String, String>> {
        self.resources
            .get(name)
            .with_context(|| format!("资源 {} 不存在", name))
    }

    /// 构建资源的 SSH 连接配置
    pub fn ssh_config(&self, name: &str) -> Result<SshConfig> {
        let attributes = self.get_resource(name)?;
        let reference: ResourceReference = attributes.iter().collect();

        let factory = ResourceConfigFactory::new();
        let resource = factory.object_instance(&reference);

        SshConfig::from_resource(&resource)
            .with_context(|| format!("资源 {} 的 SSH 配置无效", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(host: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("host".to_string(), host.to_string()),
            ("username".to_string(), "deploy".to_string()),
            ("password".to_string(), "secret".to_string()),
        ])
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.resources.is_empty());
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_add_remove_resource() {
        let mut config = CliConfig::default();

        config.add_resource("web01", attributes("10.0.0.1")).unwrap();
        config.add_resource("web02", attributes("10.0.0.2")).unwrap();
        assert_eq!(config.resources.len(), 2);

        config.remove_resource("web01").unwrap();
        assert_eq!(config.resources.len(), 1);
        assert!(config.remove_resource("web01").is_err());
    }

    #[test]
    fn test_duplicate_resource() {
        let mut config = CliConfig::default();
        config.add_resource("web01", attributes("10.0.0.1")).unwrap();
        assert!(config.add_resource("web01", attributes("10.0.0.9")).is_err());
    }

    #[test]
    fn test_ssh_config_from_resource() {
        let mut config = CliConfig::default();
        let mut attrs = attributes(" 10.0.0.1 ");
        attrs.insert("port".to_string(), "2222".to_string());
        attrs.insert("command_timeout".to_string(), "0".to_string());
        config.add_resource("web01", attrs).unwrap();

        let ssh = config.ssh_config("web01").unwrap();
        assert_eq!(ssh.host, "10.0.0.1");
        assert_eq!(ssh.port, 2222);
        assert_eq!(ssh.username, "deploy");
        assert_eq!(ssh.options.command_timeout, None);
    }

    #[test]
    fn test_ssh_config_missing_password() {
        let mut config = CliConfig::default();
        let mut attrs = attributes("10.0.0.1");
        attrs.remove("password");
        config.add_resource("web01", attrs).unwrap();

        assert!(config.ssh_config("web01").is_err());
        assert!(config.ssh_config("nope").is_err());
    }

    #[test]
    fn test_toml_layout() {
        let content = r#"
            version = "1.0"

            [resources.web01]
            host = "10.0.0.1"
            username = "deploy"
            password = "secret"
            sudo_prompt = "[sudo-prompt]"
        "#;

        let config: CliConfig = toml::from_str(content).unwrap();
        assert_eq!(config.get_resource("web01").unwrap()["host"], "10.0.0.1");

        let ssh = config.ssh_config("web01").unwrap();
        assert!(matches!(
            ssh.options.password_injection,
            opstool_ssh_executor::PasswordInjection::OnPrompt { ref marker } if marker == "[sudo-prompt]"
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("opstool-config-{}", std::process::id()))
            .join("config.toml");

        let mut config = CliConfig::default();
        config.add_resource("web01", attributes("10.0.0.1")).unwrap();
        config.save(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.resources, config.resources);

        // 只保存版本和资源
        let saved = fs::read_to_string(&path).unwrap();
        let table: toml::Table = toml::from_str(&saved).unwrap();
        let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["resources", "version"]);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let config = CliConfig::load(Path::new("/nonexistent/opstool/config.toml")).unwrap();
        assert!(config.resources.is_empty());
    }
}
