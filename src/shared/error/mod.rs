//! 统一错误处理模块
//!
//! 定义系统中所有错误类型，提供统一的错误处理机制

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::path::ErrorKind,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// 字段级验证错误集合（字段名 -> 错误消息列表）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为字段追加一条错误消息
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 获取某字段的错误消息
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// 没有错误时返回 Ok，否则转换为验证错误
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// 应用程序统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 数据库相关错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    /// 认证相关错误
    #[error("认证错误: {0}")]
    Authentication(#[from] crate::infrastructure::AuthError),

    /// 字段验证错误
    #[error("验证错误: {0}")]
    Validation(ValidationErrors),

    /// 请求前置条件不满足（ID不一致、编码为空、编码重复）
    #[error("请求无效: {0}")]
    BadRequest(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 资源未找到错误
    #[error("资源未找到: {0}")]
    NotFound(String),
}

impl AppError {
    /// 获取HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// 获取错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Authentication(_) => "AUTH_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
        }
    }

    /// 返回给客户端的消息，服务端错误不暴露内部细节
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Se produjeron uno o más errores de validación.".to_string(),
            AppError::BadRequest(message) | AppError::NotFound(message) => message.clone(),
            AppError::Authentication(e) => e.to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "Error interno del servidor.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_code = self.error_code();

        if status_code.is_server_error() {
            tracing::error!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "处理请求时发生错误"
            );
        } else {
            tracing::warn!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "请求被拒绝"
            );
        }

        let mut body = json!({
            "statusCode": status_code.as_u16(),
            "message": self.client_message(),
            "code": error_code,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let AppError::Validation(errors) = &self {
            body["errors"] = json!(errors);
        }

        (status_code, Json(body)).into_response()
    }
}

/// 请求体无法反序列化时归入字段错误，其余拒绝原因作为请求无效
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let body_text = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                let (field, message) = split_body_error(&body_text);
                let mut errors = ValidationErrors::new();
                errors.add(field, message);
                AppError::Validation(errors)
            }
            _ => AppError::BadRequest(body_text),
        }
    }
}

/// 路径参数无法解析时归入字段错误
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                let (field, message) = match e.kind() {
                    ErrorKind::ParseErrorAtKey { key, value, .. } => {
                        (key.clone(), format!("El valor '{}' no es válido.", value))
                    }
                    ErrorKind::ParseError { value, .. }
                    | ErrorKind::ParseErrorAtIndex { value, .. } => {
                        ("id".to_string(), format!("El valor '{}' no es válido.", value))
                    }
                    _ => ("id".to_string(), e.body_text()),
                };
                let mut errors = ValidationErrors::new();
                errors.add(field, message);
                AppError::Validation(errors)
            }
            other => AppError::Internal(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// 从 serde 错误文本中拆出字段路径，例如 `nombres: invalid type ...`
fn split_body_error(body_text: &str) -> (String, String) {
    let detail = body_text
        .split_once("target type: ")
        .map(|(_, detail)| detail)
        .unwrap_or(body_text);

    match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (path.to_string(), message.to_string())
        }
        _ => ("body".to_string(), detail.to_string()),
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 请求无效错误构造宏
#[macro_export]
macro_rules! bad_request {
    ($msg:expr) => {
        $crate::shared::error::AppError::BadRequest($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::BadRequest(format!($fmt, $($arg)*))
    };
}

/// 资源未找到错误构造宏
#[macro_export]
macro_rules! not_found {
    ($msg:expr) => {
        $crate::shared::error::AppError::NotFound($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::NotFound(format!($fmt, $($arg)*))
    };
}

/// 内部错误构造宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::shared::error::AppError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::Internal(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_payload_contains_field_map() {
        let mut errors = ValidationErrors::new();
        errors.add("nombres", "El campo nombres es obligatorio.");
        errors.add("nombres", "otro");
        errors.add("codigo", "demasiado largo");

        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"]["nombres"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"]["codigo"][0], "demasiado largo");
    }

    #[tokio::test]
    async fn test_bad_request_payload_keeps_message() {
        let response = bad_request!("El código {} ya existe.", "EST0000099").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["message"], "El código EST0000099 ya existe.");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let error = internal_error!("连接池泄漏");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.client_message(), "Error interno del servidor.");
    }

    #[test]
    fn test_split_body_error_extracts_field_path() {
        let (field, message) = split_body_error(
            "Failed to deserialize the JSON body into the target type: nombres: invalid type: integer `5`, expected a string",
        );
        assert_eq!(field, "nombres");
        assert!(message.starts_with("invalid type"));

        let (field, message) = split_body_error("Failed to parse the request body as JSON: expected value");
        assert_eq!(field, "body");
        assert_eq!(message, "Failed to parse the request body as JSON: expected value");
    }

    #[test]
    fn test_empty_validation_errors_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
