//! 数据库客户端

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::data_source::DataSourceRegistry;
use crate::error::{DbError, Result};

/// 数据库客户端，同一时间最多持有一个连接池
pub struct DbClient {
    registry: DataSourceRegistry,
    pool: Mutex<Option<SqlitePool>>,
}

impl DbClient {
    pub fn new(registry: DataSourceRegistry) -> Self {
        Self {
            registry,
            pool: Mutex::new(None),
        }
    }

    /// 按数据源名称连接
    ///
    /// 返回 true 表示连接成功或已经连接，错误只记录日志。
    pub async fn connect_with_data_source(&self, name: &str) -> bool {
        match self.try_connect(name).await {
            Ok(()) => true,
            Err(e) => {
                error!("连接数据源 {} 失败: {}", name, e);
                false
            }
        }
    }

    /// 按数据源名称连接，已连接时不做任何事
    pub async fn try_connect(&self, name: &str) -> Result<()> {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            info!("数据库连接已建立");
            return Ok(());
        }

        info!("尝试连接数据源 {}", name);
        let source = self.registry.lookup(name)?;
        let connected = SqlitePoolOptions::new()
            .max_connections(source.max_connections)
            .connect(&source.url)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        *pool = Some(connected);
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    /// 断开连接，可重复调用
    pub async fn disconnect(&self) {
        info!("断开数据库连接");
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
        }
    }

    /// 执行写入语句，错误只记录日志
    pub async fn insert(&self, query: &str) {
        info!("开始写入");
        if let Err(e) = self.try_execute(query).await {
            error!("写入失败: {}", e);
        }
        info!("写入结束");
    }

    /// 执行语句，返回受影响的行数
    pub async fn try_execute(&self, query: &str) -> Result<u64> {
        let pool = self
            .pool
            .lock()
            .await
            .clone()
            .ok_or(DbError::NotConnected)?;

        let result = sqlx::query(query).execute(&pool).await?;
        Ok(result.rows_affected())
    }
}
