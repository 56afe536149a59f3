//! OpsTool 通用类型定义
//!
//! 资源环境配置：把一组 `(类型, 内容)` 形式的引用条目转换成属性表，
//! 由 CLI 和 SSH 执行器共享，用于描述主机档案等外部资源。

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 资源配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("缺少资源属性: {0}")]
    MissingAttribute(String),

    #[error("资源属性 {name} 的值无效: {value}")]
    InvalidAttribute { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, ResourceError>;

/// 单个引用条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    /// 条目类型（即属性名）
    pub entry_type: String,
    /// 条目内容
    pub content: String,
}

/// 资源引用：有序的条目列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    entries: Vec<RefEntry>,
}

impl ResourceReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条目
    pub fn with_entry(mut self, entry_type: impl Into<String>, content: impl Into<String>) -> Self {
        self.push(entry_type, content);
        self
    }

    pub fn push(&mut self, entry_type: impl Into<String>, content: impl Into<String>) {
        self.entries.push(RefEntry {
            entry_type: entry_type.into(),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[RefEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResourceReference
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut reference = Self::new();
        for (k, v) in iter {
            reference.push(k, v);
        }
        reference
    }
}

/// 资源配置（属性表）
///
/// 同名条目以后出现的为准。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceConfig {
    attributes: BTreeMap<String, String>,
}

impl ResourceConfig {
    /// 从引用构建属性表
    pub fn from_reference(reference: &ResourceReference) -> Self {
        let mut config = Self::default();
        for entry in reference.entries() {
            config.set_attribute(&entry.entry_type, &entry.content);
        }
        config
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// 获取属性
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 获取必填属性
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| ResourceError::MissingAttribute(name.to_string()))
    }

    /// 获取并解析属性，缺失时返回 `Ok(None)`
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ResourceError::InvalidAttribute {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// 遍历全部属性（按名称排序）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// 资源配置工厂
///
/// 第一次调用时根据引用构建配置，之后总是返回同一份共享配置，
/// 后续传入的引用会被忽略。
#[derive(Debug, Default)]
pub struct ResourceConfigFactory {
    config: OnceLock<Arc<ResourceConfig>>,
}

impl ResourceConfigFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取配置实例
    pub fn object_instance(&self, reference: &ResourceReference) -> Arc<ResourceConfig> {
        let config = self.config.get_or_init(|| {
            debug!("构建资源配置，条目数: {}", reference.entries().len());
            Arc::new(ResourceConfig::from_reference(reference))
        });
        Arc::clone(config)
    }

    /// 是否已经构建过配置
    pub fn is_initialized(&self) -> bool {
        self.config.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reference() -> ResourceReference {
        ResourceReference::new()
            .with_entry("host", "192.168.1.100")
            .with_entry("port", "2222")
            .with_entry("username", "root")
    }

    #[test]
    fn test_config_from_reference() {
        let config = ResourceConfig::from_reference(&sample_reference());
        assert_eq!(config.len(), 3);
        assert_eq!(config.get("host"), Some("192.168.1.100"));
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn test_later_entry_wins() {
        let reference = sample_reference().with_entry("host", "10.0.0.1");
        let config = ResourceConfig::from_reference(&reference);
        assert_eq!(config.get("host"), Some("10.0.0.1"));
    }

    #[test]
    fn test_get_parsed() {
        let config = ResourceConfig::from_reference(&sample_reference());
        assert_eq!(config.get_parsed::<u16>("port").unwrap(), Some(2222));
        assert_eq!(config.get_parsed::<u16>("timeout").unwrap(), None);

        let err = config.get_parsed::<u16>("host").unwrap_err();
        assert!(matches!(err, ResourceError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_require() {
        let config = ResourceConfig::from_reference(&sample_reference());
        assert_eq!(config.require("username").unwrap(), "root");
        assert_eq!(
            config.require("password").unwrap_err(),
            ResourceError::MissingAttribute("password".to_string())
        );
    }

    #[test]
    fn test_factory_builds_once() {
        let factory = ResourceConfigFactory::new();
        assert!(!factory.is_initialized());

        let first = factory.object_instance(&sample_reference());
        let other = ResourceReference::new().with_entry("host", "other");
        let second = factory.object_instance(&other);

        assert!(factory.is_initialized());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("host"), Some("192.168.1.100"));
    }

    #[test]
    fn test_independent_factories() {
        let a = ResourceConfigFactory::new();
        let b = ResourceConfigFactory::new();
        let ca = a.object_instance(&sample_reference());
        let cb = b.object_instance(&ResourceReference::new());
        assert_eq!(ca.len(), 3);
        assert!(cb.is_empty());
    }

    #[test]
    fn test_reference_from_toml_table() {
        let table: BTreeMap<String, String> =
            toml::from_str("host = \"h\"\nusername = \"u\"\n").unwrap();
        let reference: ResourceReference = table.into_iter().collect();
        assert_eq!(reference.entries().len(), 2);
        assert_eq!(ResourceConfig::from_reference(&reference).get("username"), Some("u"));
    }
}
