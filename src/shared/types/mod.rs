//! 共享类型定义模块

/// 学生ID类型（由存储分配）
pub type EstudianteId = i32;

/// 注册（Matricula）ID类型
pub type MatriculaId = i32;

/// 学期（Periodo）ID类型
pub type PeriodoId = i32;

/// 课程ID类型
pub type CursoId = i32;
