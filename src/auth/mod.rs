//! 认证模块
//!
//! 所有学生接口都要求有效的 Bearer JWT

pub mod middleware;
pub mod jwt;

// 重新导出常用类型
pub use jwt::{Claims, JwtService};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("缺少认证信息")]
    MissingToken,
    #[error("Token已过期")]
    TokenExpired,
    #[error("无效的Token")]
    InvalidToken,
    #[error("认证失败: {0}")]
    AuthenticationFailed(String),
}
