//! 业务服务模块
//!
//! 实现核心业务逻辑和服务编排

pub mod estudiante_service;

pub use estudiante_service::{EstudianteService, SharedEstudianteService};
