use serde::{Deserialize, Serialize};
use std::env;

use crate::shared::constants::jwt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageBackend,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
    pub test_before_acquire: bool,
    pub sqlx_logging: bool,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            max_lifetime_seconds: 1800,
            test_before_acquire: true,
            sqlx_logging: false,
            run_migrations: false,
        }
    }
}

/// 学生数据存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("不支持的存储后端: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_expiry_hours: i64,
}

/// 读取环境变量并解析，缺失或解析失败时使用默认值
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        // 从环境变量加载配置
        dotenv::dotenv().ok();

        let defaults = DatabaseConfig::default();

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/cursos".to_string()),

            server: ServerConfig {
                port: env_or("PORT", 5080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },

            database: DatabaseConfig {
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
                acquire_timeout_seconds: env_or("DB_ACQUIRE_TIMEOUT", defaults.acquire_timeout_seconds),
                idle_timeout_seconds: env_or("DB_IDLE_TIMEOUT", defaults.idle_timeout_seconds),
                max_lifetime_seconds: env_or("DB_MAX_LIFETIME", defaults.max_lifetime_seconds),
                test_before_acquire: env_or("DB_TEST_BEFORE_ACQUIRE", defaults.test_before_acquire),
                sqlx_logging: env_or("DB_SQLX_LOGGING", defaults.sqlx_logging),
                run_migrations: env_or("DB_RUN_MIGRATIONS", defaults.run_migrations),
            },

            storage: StorageBackend::parse(
                &env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
            )?,

            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "your-super-secret-jwt-key-change-me!".to_string()),
                jwt_issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| jwt::DEFAULT_ISSUER.to_string()),
                token_expiry_hours: env_or("TOKEN_EXPIRY_HOURS", 24),
            },
        };

        if config.auth.jwt_secret.len() < jwt::JWT_SECRET_MIN_LENGTH {
            tracing::warn!(
                "⚠️ JWT_SECRET 长度不足 {} 个字符，请在生产环境中更换",
                jwt::JWT_SECRET_MIN_LENGTH
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("postgres").unwrap(), StorageBackend::Postgres);
        assert_eq!(StorageBackend::parse(" PostgreSQL ").unwrap(), StorageBackend::Postgres);
        assert_eq!(StorageBackend::parse("memory").unwrap(), StorageBackend::Memory);
        assert!(StorageBackend::parse("sqlite").is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_parse_failure() {
        env::set_var("CURSOS_TEST_ENV_OR", "no-es-numero");
        assert_eq!(env_or("CURSOS_TEST_ENV_OR", 7u32), 7);
        env::set_var("CURSOS_TEST_ENV_OR", "11");
        assert_eq!(env_or("CURSOS_TEST_ENV_OR", 7u32), 11);
        env::remove_var("CURSOS_TEST_ENV_OR");
        assert_eq!(env_or("CURSOS_TEST_ENV_OR", 7u32), 7);
    }
}
