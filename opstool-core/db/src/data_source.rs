//! 数据源登记

use std::collections::BTreeMap;

use opstool_common::ResourceConfig;

use crate::error::{DbError, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 数据源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    /// 连接地址，如 `sqlite:///var/lib/opstool/audit.db`
    pub url: String,
    pub max_connections: u32,
}

impl DataSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// 从资源属性构建
    ///
    /// | 属性 | 必填 | 说明 |
    /// |------|------|------|
    /// | `url` | 是 | 连接地址 |
    /// | `max_connections` | 否 | 连接池大小 |
    pub fn from_resource(resource: &ResourceConfig) -> Result<Self> {
        let mut source = Self::new(resource.require("url")?.trim());
        if let Some(max) = resource.get_parsed::<u32>("max_connections")? {
            source = source.max_connections(max);
        }
        Ok(source)
    }
}

/// 数据源名称到数据源的映射
#[derive(Debug, Clone, Default)]
pub struct DataSourceRegistry {
    sources: BTreeMap<String, DataSource>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记数据源，同名覆盖
    pub fn register(&mut self, name: impl Into<String>, source: DataSource) {
        self.sources.insert(name.into(), source);
    }

    pub fn lookup(&self, name: &str) -> Result<&DataSource> {
        self.sources
            .get(name)
            .ok_or_else(|| DbError::DataSourceNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opstool_common::ResourceReference;

    #[test]
    fn test_from_resource() {
        let reference = ResourceReference::new()
            .with_entry("url", " sqlite::memory: ")
            .with_entry("max_connections", "1");
        let resource = ResourceConfig::from_reference(&reference);

        let source = DataSource::from_resource(&resource).unwrap();
        assert_eq!(source.url, "sqlite::memory:");
        assert_eq!(source.max_connections, 1);
    }

    #[test]
    fn test_from_resource_errors() {
        let missing = ResourceConfig::from_reference(&ResourceReference::new());
        assert!(matches!(
            DataSource::from_resource(&missing),
            Err(DbError::InvalidDataSource(_))
        ));

        let reference = ResourceReference::new()
            .with_entry("url", "sqlite::memory:")
            .with_entry("max_connections", "many");
        let invalid = ResourceConfig::from_reference(&reference);
        assert!(DataSource::from_resource(&invalid).is_err());
    }

    #[test]
    fn test_lookup() {
        let mut registry = DataSourceRegistry::new();
        registry.register("jdbc/audit", DataSource::new("sqlite::memory:"));

        assert_eq!(registry.lookup("jdbc/audit").unwrap().max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(matches!(
            registry.lookup("jdbc/other"),
            Err(DbError::DataSourceNotFound(ref name)) if name == "jdbc/other"
        ));
    }
}
