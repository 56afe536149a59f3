//! OpsTool 数据库工具
//!
//! 数据源按名称（如 `jdbc/myds`）登记在 [`DataSourceRegistry`] 中，
//! [`DbClient`] 按名称连接，之后执行写入语句。
//!
//! ```ignore
//! use opstool_db::{DataSource, DataSourceRegistry, DbClient};
//!
//! let mut registry = DataSourceRegistry::new();
//! registry.register("jdbc/audit", DataSource::new("sqlite:///var/lib/opstool/audit.db"));
//!
//! let db = DbClient::new(registry);
//! if db.connect_with_data_source("jdbc/audit").await {
//!     db.insert("INSERT INTO audit (host, command) VALUES ('web01', 'uptime')").await;
//! }
//! db.disconnect().await;
//! ```

mod client;
mod data_source;
mod error;

pub use client::DbClient;
pub use data_source::{DataSource, DataSourceRegistry, DEFAULT_MAX_CONNECTIONS};
pub use error::{DbError, Result};
