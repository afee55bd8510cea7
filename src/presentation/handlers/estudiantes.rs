//! 学生管理处理器
//!
//! 处理学生CRUD、编码变更、JSON Patch 和注册视图

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use tracing::{debug, info, instrument};

use crate::auth::Claims;
use crate::business::domain::{Estudiante, EstudianteMatriculaInscripcionesVM, PatchDocument};
use crate::presentation::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::presentation::dto::{location_for, CambiarCodigoQuery, GetEstudianteQuery};
use crate::presentation::routes::{AppState, ESTUDIANTES_BASE};
use crate::shared::{AppResult, EstudianteId};

/// 获取学生列表
#[instrument(skip(state, claims))]
pub async fn list_estudiantes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Estudiante>>> {
    info!("📋 获取学生列表请求 (操作者: {})", claims.username);

    let estudiantes = state.estudiantes.list().await?;

    info!("✅ 获取学生列表成功: {} 名学生", estudiantes.len());
    Ok(Json(estudiantes))
}

/// 按ID获取学生
#[instrument(skip(state, query))]
pub async fn get_estudiante(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<EstudianteId>,
    ApiQuery(query): ApiQuery<GetEstudianteQuery>,
) -> AppResult<Json<Estudiante>> {
    debug!("🔍 获取学生: ID {} (codigo: {:?})", id, query.codigo);

    let estudiante = state.estudiantes.get(id).await?;
    Ok(Json(estudiante))
}

/// 创建学生
#[instrument(skip(state, claims, body))]
pub async fn create_estudiante(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<Estudiante>,
) -> AppResult<impl IntoResponse> {
    info!("👤 创建学生请求: {} {} (操作者: {})", body.nombres, body.apellidos, claims.username);

    let creado = state.estudiantes.create(body).await?;
    let location = location_for(ESTUDIANTES_BASE, &creado);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(creado)))
}

/// 整体更新学生
#[instrument(skip(state, claims, body))]
pub async fn update_estudiante(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<EstudianteId>,
    ApiJson(body): ApiJson<Estudiante>,
) -> AppResult<StatusCode> {
    info!("🔄 更新学生请求: ID {} (操作者: {})", id, claims.username);

    state.estudiantes.replace(id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 变更学生编码
#[instrument(skip(state, claims))]
pub async fn cambiar_codigo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<EstudianteId>,
    ApiQuery(query): ApiQuery<CambiarCodigoQuery>,
) -> AppResult<Json<Estudiante>> {
    info!("🏷️ 变更学生编码请求: ID {} (操作者: {})", id, claims.username);

    let codigo = query.codigo.unwrap_or_default();
    let estudiante = state.estudiantes.change_code(id, &codigo).await?;
    Ok(Json(estudiante))
}

/// 删除学生
#[instrument(skip(state, claims))]
pub async fn delete_estudiante(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<EstudianteId>,
) -> AppResult<StatusCode> {
    info!("🗑️ 删除学生请求: ID {} (操作者: {})", id, claims.username);

    state.estudiantes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// JSON Patch 部分更新
#[instrument(skip(state, claims, patch))]
pub async fn patch_estudiante(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<EstudianteId>,
    ApiJson(patch): ApiJson<PatchDocument>,
) -> AppResult<Json<Estudiante>> {
    info!(
        "🩹 学生补丁请求: ID {} 共 {} 个操作 (操作者: {})",
        id,
        patch.operations().len(),
        claims.username
    );

    let estudiante = state.estudiantes.patch(id, &patch).await?;
    Ok(Json(estudiante))
}

/// 学生注册与选课视图；学生不存在时返回 `null`
#[instrument(skip(state))]
pub async fn matriculas_inscripciones(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<EstudianteId>,
) -> AppResult<Json<Option<EstudianteMatriculaInscripcionesVM>>> {
    let vista = state.estudiantes.enrollment_view(id).await?;
    if vista.is_none() {
        debug!("学生 {} 不存在，返回空视图", id);
    }
    Ok(Json(vista))
}
