pub mod connection;
pub mod estudiantes_repository;
pub mod memory_store;

use std::sync::Arc;

use sqlx::PgPool;

use crate::business::domain::EstudianteStore;
use crate::infrastructure::config::{Config, DatabaseConfig, StorageBackend};
use connection::{DatabaseConnection, DatabaseConnectionError, PoolStats};
pub use estudiantes_repository::EstudiantesRepository;
pub use memory_store::MemoryEstudianteStore;

/// 数据库错误类型
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("连接管理器错误: {0}")]
    ConnectionManager(#[from] DatabaseConnectionError),

    #[error("SQL执行错误: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("迁移错误: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 数据库管理器 - 包装连接管理器和学生存储
#[derive(Clone)]
pub struct Database {
    connection_manager: Option<DatabaseConnection>,
    estudiantes: Arc<dyn EstudianteStore>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection_manager", &self.connection_manager)
            .field("backend", &self.backend())
            .finish()
    }
}

impl Database {
    /// 使用配置创建数据库实例
    pub async fn new(config: &Config) -> Result<Self, DatabaseError> {
        match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("⚠️ 使用内存存储，数据不会持久化");
                Ok(Self::in_memory(MemoryEstudianteStore::new()))
            }
            StorageBackend::Postgres => {
                let connection_manager =
                    DatabaseConnection::new(&config.database_url, &config.database).await?;
                Ok(Self::from_connection(connection_manager))
            }
        }
    }

    /// 仅使用连接串和默认连接池配置创建
    pub async fn new_simple(database_url: &str) -> Result<Self, DatabaseError> {
        let connection_manager = DatabaseConnection::new(database_url, &DatabaseConfig::default()).await?;
        Ok(Self::from_connection(connection_manager))
    }

    /// 基于内存存储创建
    pub fn in_memory(store: MemoryEstudianteStore) -> Self {
        Self {
            connection_manager: None,
            estudiantes: Arc::new(store),
        }
    }

    fn from_connection(connection_manager: DatabaseConnection) -> Self {
        let estudiantes = Arc::new(EstudiantesRepository::new(connection_manager.pool().clone()));
        Self {
            connection_manager: Some(connection_manager),
            estudiantes,
        }
    }

    /// 学生存储
    pub fn estudiantes(&self) -> Arc<dyn EstudianteStore> {
        self.estudiantes.clone()
    }

    /// 当前存储后端
    pub fn backend(&self) -> StorageBackend {
        if self.connection_manager.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    /// 获取数据库连接池（内存存储时为空）
    pub fn pool(&self) -> Option<&PgPool> {
        self.connection_manager.as_ref().map(DatabaseConnection::pool)
    }

    /// 执行健康检查
    pub async fn health_check(&self) -> Result<bool, DatabaseError> {
        match &self.connection_manager {
            Some(connection) => Ok(connection.health_check().await?),
            None => Ok(true),
        }
    }

    /// 获取连接池统计信息
    pub async fn get_pool_stats(&self) -> Option<PoolStats> {
        match &self.connection_manager {
            Some(connection) => Some(connection.get_pool_stats().await),
            None => None,
        }
    }

    /// 检查学生表是否存在
    pub async fn check_migrations(&self) -> Result<bool, DatabaseError> {
        let Some(pool) = self.pool() else {
            return Ok(true);
        };

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = 'public' AND table_name = 'estudiante'",
        )
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// 执行内嵌的数据库迁移
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        if let Some(pool) = self.pool() {
            sqlx::migrate!("./migrations").run(pool).await?;
        }
        Ok(())
    }

    /// 关闭数据库连接
    pub async fn close(&self) {
        if let Some(connection) = &self.connection_manager {
            connection.close().await;
        }
    }
}
