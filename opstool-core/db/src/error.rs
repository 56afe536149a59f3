use thiserror::Error;

/// 数据库错误类型
#[derive(Error, Debug)]
pub enum DbError {
    /// 数据库连接错误
    #[error("数据库连接失败: {0}")]
    ConnectionError(String),

    #[error("数据源不存在: {0}")]
    DataSourceNotFound(String),

    /// 数据源配置错误
    #[error(transparent)]
    InvalidDataSource(#[from] opstool_common::ResourceError),

    #[error("尚未连接数据库")]
    NotConnected,

    /// 数据库操作错误
    #[error("数据库操作失败: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
