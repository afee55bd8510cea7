//! 学生数据库操作
//!
//! 基于 PostgreSQL 实现学生的CRUD和注册关联查询

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, instrument};

use crate::bad_request;
use crate::business::domain::{
    CodigoFn, Curso, Estudiante, EstudianteConMatriculas, EstudianteStore, InscripcionCurso,
    Matricula, Periodo,
};
use crate::shared::constants::database::{CODIGO_UNIQUE_INDEX, UNIQUE_VIOLATION};
use crate::shared::{AppError, AppResult, EstudianteId};

const SELECT_ESTUDIANTE: &str = r#"
    SELECT id_estudiante, COALESCE(codigo, '') AS codigo, nombres, apellidos
    FROM estudiante
"#;

/// 注册关联查询的扁平行（选课部分为左连接，可能为空）
#[derive(Debug, sqlx::FromRow)]
struct MatriculaJoinRow {
    id_matricula: i32,
    id_periodo: i32,
    fecha: DateTime<Utc>,
    id_inscripcion: Option<i32>,
    id_curso: Option<i32>,
    curso_codigo: Option<String>,
    curso_descripcion: Option<String>,
    inscripcion_id_periodo: Option<i32>,
    inscripcion_anio: Option<i32>,
}

impl MatriculaJoinRow {
    fn inscripcion(&self) -> Option<InscripcionCurso> {
        Some(InscripcionCurso {
            id_inscripcion: self.id_inscripcion?,
            curso: Curso {
                id_curso: self.id_curso?,
                codigo: self.curso_codigo.clone()?,
                descripcion: self.curso_descripcion.clone().unwrap_or_default(),
            },
            periodo: Periodo {
                id_periodo: self.inscripcion_id_periodo?,
                anio: self.inscripcion_anio?,
            },
        })
    }
}

/// 学生数据库服务
#[derive(Debug, Clone)]
pub struct EstudiantesRepository {
    pool: PgPool,
}

impl EstudiantesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 将编码唯一约束冲突转换为业务错误，其余作为数据库错误
    fn map_write_error(e: sqlx::Error, codigo: &str) -> AppError {
        if let sqlx::Error::Database(db_error) = &e {
            if db_error.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_error.constraint() == Some(CODIGO_UNIQUE_INDEX)
            {
                return bad_request!("El código {} ya existe.", codigo);
            }
        }
        error!("数据库写入错误: {}", e);
        AppError::Database(e)
    }

    fn map_read_error(e: sqlx::Error) -> AppError {
        error!("数据库查询错误: {}", e);
        AppError::Database(e)
    }
}

#[async_trait]
impl EstudianteStore for EstudiantesRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> AppResult<Vec<Estudiante>> {
        let estudiantes = sqlx::query_as::<_, Estudiante>(&format!("{} ORDER BY id_estudiante", SELECT_ESTUDIANTE))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_read_error)?;

        info!("🔍 数据库查询返回 {} 名学生", estudiantes.len());
        Ok(estudiantes)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: EstudianteId) -> AppResult<Option<Estudiante>> {
        sqlx::query_as::<_, Estudiante>(&format!("{} WHERE id_estudiante = $1", SELECT_ESTUDIANTE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_read_error)
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: EstudianteId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM estudiante WHERE id_estudiante = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_read_error)
    }

    #[instrument(skip(self, estudiante, codigo_for))]
    async fn insert_with_codigo(&self, estudiante: &Estudiante, codigo_for: CodigoFn) -> AppResult<Estudiante> {
        let mut tx = self.pool.begin().await.map_err(Self::map_read_error)?;

        // 第一阶段：插入获取ID，编码暂为空
        let id: EstudianteId = sqlx::query_scalar(
            r#"
            INSERT INTO estudiante (codigo, nombres, apellidos)
            VALUES (NULL, $1, $2)
            RETURNING id_estudiante
            "#,
        )
        .bind(&estudiante.nombres)
        .bind(&estudiante.apellidos)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(e, ""))?;

        // 第二阶段：根据ID写入编码
        let codigo = codigo_for(id);
        sqlx::query("UPDATE estudiante SET codigo = $1 WHERE id_estudiante = $2")
            .bind(&codigo)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::map_write_error(e, &codigo))?;

        tx.commit().await.map_err(|e| Self::map_write_error(e, &codigo))?;

        info!("✅ 学生已写入数据库: ID {} 编码 {}", id, codigo);

        Ok(Estudiante {
            id_estudiante: id,
            codigo,
            nombres: estudiante.nombres.clone(),
            apellidos: estudiante.apellidos.clone(),
        })
    }

    #[instrument(skip(self, estudiante), fields(id = estudiante.id_estudiante))]
    async fn update(&self, estudiante: &Estudiante) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE estudiante
            SET codigo = NULLIF($1, ''), nombres = $2, apellidos = $3
            WHERE id_estudiante = $4
            "#,
        )
        .bind(&estudiante.codigo)
        .bind(&estudiante.nombres)
        .bind(&estudiante.apellidos)
        .bind(estudiante.id_estudiante)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &estudiante.codigo))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: EstudianteId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM estudiante WHERE id_estudiante = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("删除学生失败: {}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn codigo_in_use(&self, codigo: &str, except: EstudianteId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM estudiante WHERE codigo = $1 AND id_estudiante <> $2)",
        )
        .bind(codigo)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_read_error)
    }

    #[instrument(skip(self))]
    async fn load_matriculas(&self, id: EstudianteId) -> AppResult<Option<EstudianteConMatriculas>> {
        let Some(estudiante) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, MatriculaJoinRow>(
            r#"
            SELECT
                m.id_matricula,
                m.id_periodo,
                m.fecha,
                ic.id_inscripcion,
                c.id_curso,
                c.codigo AS curso_codigo,
                c.descripcion AS curso_descripcion,
                p.id_periodo AS inscripcion_id_periodo,
                p.anio AS inscripcion_anio
            FROM matricula m
            LEFT JOIN (
                inscripcion_curso ic
                JOIN curso c ON c.id_curso = ic.id_curso
                JOIN periodo p ON p.id_periodo = ic.id_periodo
            ) ON ic.id_matricula = m.id_matricula
            WHERE m.id_estudiante = $1
            ORDER BY m.id_matricula, ic.id_inscripcion
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_read_error)?;

        // 按注册分组，行已按 id_matricula 排序
        let mut matriculas: Vec<Matricula> = Vec::new();
        for row in rows {
            let inscripcion = row.inscripcion();
            match matriculas.last_mut() {
                Some(last) if last.id_matricula == row.id_matricula => {
                    last.inscripciones.extend(inscripcion);
                }
                _ => matriculas.push(Matricula {
                    id_matricula: row.id_matricula,
                    id_periodo: row.id_periodo,
                    fecha: row.fecha,
                    inscripciones: inscripcion.into_iter().collect(),
                }),
            }
        }

        info!("🔍 学生 {} 共有 {} 条注册记录", id, matriculas.len());
        Ok(Some(EstudianteConMatriculas { estudiante, matriculas }))
    }
}
