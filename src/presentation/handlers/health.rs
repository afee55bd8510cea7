//! 健康检查处理器

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{info, instrument};

use crate::presentation::routes::AppState;

/// 系统健康状态
#[derive(Debug, Serialize)]
pub struct SystemHealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheck>,
}

/// 单项健康检查结果
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub response_time_ms: u64,
    pub details: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// 系统健康检查（公开）
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<SystemHealthResponse>) {
    info!("🏥 健康检查请求");

    let database = &state.database;
    let mut checks = HashMap::new();

    let db_check_start = std::time::Instant::now();
    let database_check = match database.health_check().await {
        Ok(_) => HealthCheck {
            status: "healthy".to_string(),
            response_time_ms: db_check_start.elapsed().as_millis() as u64,
            details: Some(serde_json::json!({
                "backend": database.backend(),
                "connection_pool": database.get_pool_stats().await,
            })),
            error: None,
        },
        Err(e) => HealthCheck {
            status: "unhealthy".to_string(),
            response_time_ms: db_check_start.elapsed().as_millis() as u64,
            details: None,
            error: Some(e.to_string()),
        },
    };
    checks.insert("database".to_string(), database_check);

    let healthy = checks.values().all(|check| check.status == "healthy");
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = SystemHealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
    };

    (status_code, Json(response))
}
