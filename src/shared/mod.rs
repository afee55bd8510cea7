//! 共享模块
//!
//! 包含跨层共享的类型、错误处理、常量定义等

pub mod error;
pub mod types;
pub mod constants;

// 重新导出常用类型
pub use error::{AppError, AppResult, ValidationErrors};
pub use types::{CursoId, EstudianteId, MatriculaId, PeriodoId};
