//! 学生接口的查询参数

use serde::Deserialize;

use crate::business::domain::Estudiante;

/// `GET /estudiantes/:id` 可附带的编码（仅为兼容创建时返回的地址，不参与查询）
#[derive(Debug, Default, Deserialize)]
pub struct GetEstudianteQuery {
    pub codigo: Option<String>,
}

/// `PATCH /estudiantes/CambiarCodigo/:id?codigo=...`
#[derive(Debug, Default, Deserialize)]
pub struct CambiarCodigoQuery {
    pub codigo: Option<String>,
}

/// 新建资源的地址，携带ID和编码
pub fn location_for(base: &str, estudiante: &Estudiante) -> String {
    format!(
        "{}/{}?codigo={}",
        base.trim_end_matches('/'),
        estudiante.id_estudiante,
        estudiante.codigo
    )
}
