//! HTTP请求处理器模块
//! 
//! 实现所有API端点的处理逻辑

pub mod estudiantes;
pub mod health;
