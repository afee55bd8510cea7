//! 内存学生存储
//!
//! 与 PostgreSQL 存储语义一致的进程内实现：ID 自增、编码唯一、
//! 删除学生时级联删除其注册和选课。用于本地运行和测试。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::bad_request;
use crate::business::domain::{
    CodigoFn, Curso, Estudiante, EstudianteConMatriculas, EstudianteStore, InscripcionCurso,
    Matricula, Periodo,
};
use crate::shared::{AppResult, CursoId, EstudianteId, MatriculaId, PeriodoId};

#[derive(Debug, Clone)]
struct MatriculaRow {
    id_matricula: MatriculaId,
    id_estudiante: EstudianteId,
    id_periodo: PeriodoId,
    fecha: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct InscripcionRow {
    id_inscripcion: i32,
    id_matricula: MatriculaId,
    id_curso: CursoId,
    id_periodo: PeriodoId,
}

#[derive(Debug, Default)]
struct MemoryState {
    estudiantes: BTreeMap<EstudianteId, Estudiante>,
    periodos: BTreeMap<PeriodoId, Periodo>,
    cursos: BTreeMap<CursoId, Curso>,
    matriculas: Vec<MatriculaRow>,
    inscripciones: Vec<InscripcionRow>,
    next_estudiante_id: EstudianteId,
    next_row_id: i32,
}

impl MemoryState {
    fn next_row_id(&mut self) -> i32 {
        self.next_row_id += 1;
        self.next_row_id
    }

    fn codigo_taken(&self, codigo: &str, except: EstudianteId) -> bool {
        !codigo.is_empty()
            && self
                .estudiantes
                .values()
                .any(|e| e.codigo == codigo && e.id_estudiante != except)
    }
}

/// 内存学生存储
#[derive(Debug, Clone, Default)]
pub struct MemoryEstudianteStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryEstudianteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增学期
    pub async fn add_periodo(&self, anio: i32) -> PeriodoId {
        let mut state = self.state.write().await;
        let id_periodo = state.next_row_id();
        state.periodos.insert(id_periodo, Periodo { id_periodo, anio });
        id_periodo
    }

    /// 新增课程
    pub async fn add_curso(&self, codigo: &str, descripcion: &str) -> CursoId {
        let mut state = self.state.write().await;
        let id_curso = state.next_row_id();
        state.cursos.insert(
            id_curso,
            Curso {
                id_curso,
                codigo: codigo.to_string(),
                descripcion: descripcion.to_string(),
            },
        );
        id_curso
    }

    /// 新增注册记录
    pub async fn add_matricula(
        &self,
        id_estudiante: EstudianteId,
        id_periodo: PeriodoId,
        fecha: DateTime<Utc>,
    ) -> AppResult<MatriculaId> {
        let mut state = self.state.write().await;
        if !state.estudiantes.contains_key(&id_estudiante) {
            return Err(bad_request!("El estudiante {} no existe.", id_estudiante));
        }
        if !state.periodos.contains_key(&id_periodo) {
            return Err(bad_request!("El periodo {} no existe.", id_periodo));
        }
        let id_matricula = state.next_row_id();
        state.matriculas.push(MatriculaRow {
            id_matricula,
            id_estudiante,
            id_periodo,
            fecha,
        });
        Ok(id_matricula)
    }

    /// 新增选课记录
    pub async fn add_inscripcion(
        &self,
        id_matricula: MatriculaId,
        id_curso: CursoId,
        id_periodo: PeriodoId,
    ) -> AppResult<i32> {
        let mut state = self.state.write().await;
        if !state.matriculas.iter().any(|m| m.id_matricula == id_matricula) {
            return Err(bad_request!("La matrícula {} no existe.", id_matricula));
        }
        if !state.cursos.contains_key(&id_curso) || !state.periodos.contains_key(&id_periodo) {
            return Err(bad_request!("Curso o periodo inexistente."));
        }
        let id_inscripcion = state.next_row_id();
        state.inscripciones.push(InscripcionRow {
            id_inscripcion,
            id_matricula,
            id_curso,
            id_periodo,
        });
        Ok(id_inscripcion)
    }

    /// 当前学生数量
    pub async fn count(&self) -> usize {
        self.state.read().await.estudiantes.len()
    }
}

#[async_trait]
impl EstudianteStore for MemoryEstudianteStore {
    async fn list(&self) -> AppResult<Vec<Estudiante>> {
        Ok(self.state.read().await.estudiantes.values().cloned().collect())
    }

    async fn find_by_id(&self, id: EstudianteId) -> AppResult<Option<Estudiante>> {
        Ok(self.state.read().await.estudiantes.get(&id).cloned())
    }

    async fn exists(&self, id: EstudianteId) -> AppResult<bool> {
        Ok(self.state.read().await.estudiantes.contains_key(&id))
    }

    async fn insert_with_codigo(&self, estudiante: &Estudiante, codigo_for: CodigoFn) -> AppResult<Estudiante> {
        let mut state = self.state.write().await;

        state.next_estudiante_id += 1;
        let id = state.next_estudiante_id;
        let codigo = codigo_for(id);
        if state.codigo_taken(&codigo, id) {
            return Err(bad_request!("El código {} ya existe.", codigo));
        }

        let creado = Estudiante {
            id_estudiante: id,
            codigo,
            ..estudiante.clone()
        };
        state.estudiantes.insert(id, creado.clone());
        debug!("内存存储新增学生: {}", id);
        Ok(creado)
    }

    async fn update(&self, estudiante: &Estudiante) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.estudiantes.contains_key(&estudiante.id_estudiante) {
            return Ok(false);
        }
        if state.codigo_taken(&estudiante.codigo, estudiante.id_estudiante) {
            return Err(bad_request!("El código {} ya existe.", estudiante.codigo));
        }
        state.estudiantes.insert(estudiante.id_estudiante, estudiante.clone());
        Ok(true)
    }

    async fn delete(&self, id: EstudianteId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.estudiantes.remove(&id).is_none() {
            return Ok(false);
        }

        let removed: Vec<MatriculaId> = state
            .matriculas
            .iter()
            .filter(|m| m.id_estudiante == id)
            .map(|m| m.id_matricula)
            .collect();
        state.matriculas.retain(|m| m.id_estudiante != id);
        state.inscripciones.retain(|i| !removed.contains(&i.id_matricula));
        Ok(true)
    }

    async fn codigo_in_use(&self, codigo: &str, except: EstudianteId) -> AppResult<bool> {
        Ok(self.state.read().await.codigo_taken(codigo, except))
    }

    async fn load_matriculas(&self, id: EstudianteId) -> AppResult<Option<EstudianteConMatriculas>> {
        let state = self.state.read().await;
        let Some(estudiante) = state.estudiantes.get(&id).cloned() else {
            return Ok(None);
        };

        let matriculas = state
            .matriculas
            .iter()
            .filter(|m| m.id_estudiante == id)
            .map(|m| Matricula {
                id_matricula: m.id_matricula,
                id_periodo: m.id_periodo,
                fecha: m.fecha,
                inscripciones: state
                    .inscripciones
                    .iter()
                    .filter(|i| i.id_matricula == m.id_matricula)
                    .filter_map(|i| {
                        Some(InscripcionCurso {
                            id_inscripcion: i.id_inscripcion,
                            curso: state.cursos.get(&i.id_curso)?.clone(),
                            periodo: state.periodos.get(&i.id_periodo)?.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        Ok(Some(EstudianteConMatriculas { estudiante, matriculas }))
    }
}
