//! 请求参数与响应辅助

pub mod estudiantes;

pub use estudiantes::{location_for, CambiarCodigoQuery, GetEstudianteQuery};
