use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tokio::sync::RwLock;

use crate::infrastructure::config::DatabaseConfig;

/// 数据库连接池统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub failed_health_checks: u64,
    pub last_health_check: chrono::DateTime<chrono::Utc>,
    pub last_health_check_ms: u64,
    pub health_check_success: bool,
}

/// 数据库连接错误类型
#[derive(Debug, thiserror::Error)]
pub enum DatabaseConnectionError {
    #[error("连接池配置错误: {0}")]
    Configuration(String),

    #[error("数据库连接失败: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("健康检查失败: {0}")]
    HealthCheckFailed(String),
}

/// 数据库连接管理器
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
    stats: Arc<RwLock<PoolStats>>,
}

impl DatabaseConnection {
    /// 创建新的数据库连接管理器
    pub async fn new(database_url: &str, config: &DatabaseConfig) -> Result<Self, DatabaseConnectionError> {
        validate_config(config)?;

        let pool = Self::create_pool(database_url, config).await?;

        let stats = Arc::new(RwLock::new(PoolStats {
            size: config.min_connections,
            idle: config.min_connections,
            failed_health_checks: 0,
            last_health_check: chrono::Utc::now(),
            last_health_check_ms: 0,
            health_check_success: false,
        }));

        let connection = Self { pool, stats };

        // 执行初始健康检查
        connection.health_check().await?;

        tracing::info!(
            "数据库连接池初始化成功 - max: {}, min: {}",
            config.max_connections,
            config.min_connections
        );

        Ok(connection)
    }

    /// 创建连接池
    async fn create_pool(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseConnectionError> {
        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .test_before_acquire(config.test_before_acquire);

        if config.sqlx_logging {
            pool_options = pool_options.after_connect(|_conn, _meta| {
                Box::pin(async move {
                    tracing::debug!("新数据库连接已建立");
                    Ok(())
                })
            });
        }

        pool_options
            .connect(database_url)
            .await
            .map_err(DatabaseConnectionError::Connection)
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 执行健康检查
    pub async fn health_check(&self) -> Result<bool, DatabaseConnectionError> {
        let start = Instant::now();

        let result = sqlx::query("SELECT 1 AS health_check, version() AS db_version")
            .fetch_one(&self.pool)
            .await;

        let elapsed = start.elapsed();
        let mut stats = self.stats.write().await;
        stats.last_health_check = chrono::Utc::now();
        stats.last_health_check_ms = elapsed.as_millis() as u64;

        match result {
            Ok(row) => {
                let version: String = row.get("db_version");
                stats.health_check_success = true;

                tracing::debug!("数据库健康检查成功 - 响应时间: {:?}, 版本: {}", elapsed, version);
                Ok(true)
            }
            Err(e) => {
                stats.health_check_success = false;
                stats.failed_health_checks += 1;

                tracing::error!("数据库健康检查失败 - 响应时间: {:?}, 错误: {:?}", elapsed, e);
                Err(DatabaseConnectionError::HealthCheckFailed(e.to_string()))
            }
        }
    }

    /// 获取连接池统计信息
    pub async fn get_pool_stats(&self) -> PoolStats {
        let mut stats = self.stats.write().await;
        stats.size = self.pool.size();
        stats.idle = self.pool.num_idle() as u32;
        stats.clone()
    }

    /// 关闭连接池
    pub async fn close(&self) {
        tracing::info!("正在关闭数据库连接池...");
        self.pool.close().await;
        tracing::info!("数据库连接池已关闭");
    }
}

/// 验证数据库配置
pub fn validate_config(config: &DatabaseConfig) -> Result<(), DatabaseConnectionError> {
    if config.max_connections == 0 {
        return Err(DatabaseConnectionError::Configuration(
            "最大连接数必须大于0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(DatabaseConnectionError::Configuration(
            "最小连接数不能大于最大连接数".to_string(),
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(DatabaseConnectionError::Configuration(
            "连接获取超时时间必须大于0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DatabaseConfig::default()).is_ok());
    }

    #[test]
    fn test_min_greater_than_max_is_rejected() {
        let config = DatabaseConfig {
            max_connections: 2,
            min_connections: 5,
            ..DatabaseConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(DatabaseConnectionError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let zero_max = DatabaseConfig {
            max_connections: 0,
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        assert!(validate_config(&zero_max).is_err());

        let zero_timeout = DatabaseConfig {
            acquire_timeout_seconds: 0,
            ..DatabaseConfig::default()
        };
        assert!(validate_config(&zero_timeout).is_err());
    }
}
