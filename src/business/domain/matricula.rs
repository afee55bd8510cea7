//! 注册与选课领域模型
//!
//! 存储层加载的三级关联图（学生 -> 注册 -> 选课 -> 课程/学期），
//! 以及由此投影得到的只读视图

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Estudiante;
use crate::shared::{CursoId, EstudianteId, MatriculaId, PeriodoId};

/// 学期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periodo {
    pub id_periodo: PeriodoId,
    pub anio: i32,
}

/// 课程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curso {
    pub id_curso: CursoId,
    pub codigo: String,
    pub descripcion: String,
}

/// 选课记录（InscripcionCurso），已关联课程和学期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscripcionCurso {
    pub id_inscripcion: i32,
    pub curso: Curso,
    pub periodo: Periodo,
}

/// 注册记录（Matricula）及其选课
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matricula {
    pub id_matricula: MatriculaId,
    pub id_periodo: PeriodoId,
    pub fecha: DateTime<Utc>,
    pub inscripciones: Vec<InscripcionCurso>,
}

/// 学生及其完整注册关联图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstudianteConMatriculas {
    pub estudiante: Estudiante,
    pub matriculas: Vec<Matricula>,
}

/// 视图：注册摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatriculaVM {
    pub id_periodo: PeriodoId,
    pub fecha: DateTime<Utc>,
}

/// 视图：选课摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionVM {
    pub id_estudiante: EstudianteId,
    pub anio: i32,
    pub codigo: String,
    pub descripcion: String,
}

/// 学生注册与选课的组合视图（不持久化，每次请求重新构建）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstudianteMatriculaInscripcionesVM {
    pub id_estudiante: EstudianteId,
    pub codigo: String,
    pub nombres: String,
    pub apellidos: String,
    pub nombre_completo: String,
    pub matriculas: Vec<MatriculaVM>,
    pub inscripciones: Vec<InscripcionVM>,
}

impl From<&EstudianteConMatriculas> for EstudianteMatriculaInscripcionesVM {
    fn from(graph: &EstudianteConMatriculas) -> Self {
        let estudiante = &graph.estudiante;

        let matriculas = graph
            .matriculas
            .iter()
            .map(|m| MatriculaVM {
                id_periodo: m.id_periodo,
                fecha: m.fecha,
            })
            .collect();

        let inscripciones = graph
            .matriculas
            .iter()
            .flat_map(|m| m.inscripciones.iter())
            .map(|i| InscripcionVM {
                id_estudiante: estudiante.id_estudiante,
                anio: i.periodo.anio,
                codigo: i.curso.codigo.clone(),
                descripcion: i.curso.descripcion.clone(),
            })
            .collect();

        Self {
            id_estudiante: estudiante.id_estudiante,
            codigo: estudiante.codigo.clone(),
            nombres: estudiante.nombres.clone(),
            apellidos: estudiante.apellidos.clone(),
            nombre_completo: estudiante.nombre_completo(),
            matriculas,
            inscripciones,
        }
    }
}
