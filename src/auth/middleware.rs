//! 认证中间件模块

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::AuthError;
use crate::presentation::routes::AppState;
use crate::shared::AppError;

/// JWT认证中间件
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从Authorization header中提取token
    let token = extract_bearer_token(request.headers())
        .ok_or(AppError::Authentication(AuthError::MissingToken))?;

    let claims = app_state
        .jwt
        .verify_token(&token)
        .map_err(AppError::Authentication)?;

    tracing::debug!("🔐 认证通过: {} ({})", claims.username, claims.sub);

    // 将Claims添加到请求扩展中
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// 从Authorization header中提取Bearer token
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
