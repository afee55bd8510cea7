//! 课程学生管理服务
//! 
//! 学生档案的增删改查、编码管理与注册选课视图，基于三层架构设计

// 核心模块
pub mod shared;          // 共享模块（错误处理、类型定义、常量）
pub mod infrastructure;  // 基础设施层（数据库、配置）
pub mod business;        // 业务逻辑层（领域模型、学生服务）
pub mod presentation;    // 表示层（HTTP处理、路由）
pub mod auth;           // 认证模块

// 重新导出核心类型
pub use infrastructure::{Config, Database};
pub use shared::{AppError, AppResult};
pub use presentation::routes::{create_routes, AppState};
