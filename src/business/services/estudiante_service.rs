//! 学生记录服务
//!
//! 创建、查询、整体更新、编码变更、JSON Patch、删除以及注册视图

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::business::domain::estudiante::{FIELDS, FIELD_ID};
use crate::business::domain::{
    generar_codigo, id_de_codigo_generado, Estudiante, EstudianteMatriculaInscripcionesVM,
    EstudianteStore, PatchDocument,
};
use crate::shared::{AppError, AppResult, EstudianteId, ValidationErrors};
use crate::{bad_request, internal_error, not_found};

/// 共享的学生服务
pub type SharedEstudianteService = Arc<EstudianteService>;

/// 学生记录服务
pub struct EstudianteService {
    store: Arc<dyn EstudianteStore>,
}

impl EstudianteService {
    pub fn new(store: Arc<dyn EstudianteStore>) -> Self {
        Self { store }
    }

    /// 全部学生
    #[instrument(skip(self))]
    pub async fn list(&self) -> AppResult<Vec<Estudiante>> {
        self.store.list().await
    }

    /// 按ID获取学生
    #[instrument(skip(self))]
    pub async fn get(&self, id: EstudianteId) -> AppResult<Estudiante> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| estudiante_no_encontrado(id))
    }

    /// 创建学生：校验 -> 插入获得ID -> 生成编码并再次保存
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: Estudiante) -> AppResult<Estudiante> {
        input.validate()?;

        // ID由存储分配，编码由ID生成
        let nuevo = Estudiante {
            id_estudiante: 0,
            codigo: String::new(),
            ..input
        };

        let creado = self.store.insert_with_codigo(&nuevo, generar_codigo).await?;
        info!("✅ 学生创建成功: ID {} 编码 {}", creado.id_estudiante, creado.codigo);
        Ok(creado)
    }

    /// 整体更新
    #[instrument(skip(self, input))]
    pub async fn replace(&self, id: EstudianteId, input: Estudiante) -> AppResult<()> {
        let mut estudiante = input;
        if estudiante.id_estudiante == 0 {
            estudiante.id_estudiante = id;
        }

        if estudiante.id_estudiante != id {
            warn!("⚠️ 路径ID {} 与请求体ID {} 不一致", id, estudiante.id_estudiante);
            return Err(bad_request!("Petición no válida."));
        }

        if !self.store.exists(id).await? {
            return Err(estudiante_no_encontrado(id));
        }

        estudiante.validate()?;
        self.check_codigo_disponible(id, &estudiante.codigo).await?;

        if !self.store.update(&estudiante).await? {
            return Err(estudiante_no_encontrado(id));
        }

        info!("✅ 学生更新成功: ID {}", id);
        Ok(())
    }

    /// 仅变更编码
    ///
    /// 唯一性先查询后写入；并发下由存储的唯一约束兜底，冲突同样返回
    /// "ya existe"。其他ID的生成编码不可使用。
    #[instrument(skip(self))]
    pub async fn change_code(&self, id: EstudianteId, codigo: &str) -> AppResult<Estudiante> {
        if codigo.trim().is_empty() {
            return Err(bad_request!("El código está vacío."));
        }

        let mut estudiante = self.get(id).await?;

        self.check_codigo_disponible(id, codigo).await?;

        estudiante.codigo = codigo.to_string();
        estudiante.validate()?;

        if !self.store.update(&estudiante).await? {
            return Err(estudiante_no_encontrado(id));
        }

        info!("✅ 学生编码已变更: ID {} -> {}", id, codigo);
        Ok(estudiante)
    }

    /// 删除学生
    #[instrument(skip(self))]
    pub async fn delete(&self, id: EstudianteId) -> AppResult<()> {
        if !self.store.delete(id).await? {
            return Err(estudiante_no_encontrado(id));
        }
        info!("🗑️ 学生已删除: ID {}", id);
        Ok(())
    }

    /// 应用 JSON Patch 后整体校验并保存
    #[instrument(skip(self, patch), fields(operations = patch.operations().len()))]
    pub async fn patch(&self, id: EstudianteId, patch: &PatchDocument) -> AppResult<Estudiante> {
        let actual = self.get(id).await?;

        let mut doc = serde_json::to_value(&actual)
            .map_err(|e| internal_error!("学生序列化失败: {}", e))?;

        if let Err(e) = patch.apply(&mut doc) {
            let mut errors = ValidationErrors::new();
            errors.add(field_for_path(e.path()), e.to_string());
            return Err(AppError::Validation(errors));
        }

        let estudiante = estudiante_from_patched(doc)?;
        if estudiante.id_estudiante != id {
            let mut errors = ValidationErrors::new();
            errors.add(FIELD_ID, "No se puede modificar el identificador del estudiante.");
            return Err(AppError::Validation(errors));
        }

        estudiante.validate()?;
        self.check_codigo_disponible(id, &estudiante.codigo).await?;

        if !self.store.update(&estudiante).await? {
            return Err(estudiante_no_encontrado(id));
        }

        info!("✅ 学生补丁已应用: ID {}", id);
        Ok(estudiante)
    }

    /// 学生注册与选课视图；学生不存在时返回 None
    #[instrument(skip(self))]
    pub async fn enrollment_view(&self, id: EstudianteId) -> AppResult<Option<EstudianteMatriculaInscripcionesVM>> {
        let graph = self.store.load_matriculas(id).await?;
        Ok(graph.as_ref().map(EstudianteMatriculaInscripcionesVM::from))
    }

    /// 新编码不能被其他学生占用，也不能是其他ID的生成编码
    async fn check_codigo_disponible(&self, id: EstudianteId, codigo: &str) -> AppResult<()> {
        if codigo.is_empty() {
            return Ok(());
        }

        if self.store.codigo_in_use(codigo, id).await? {
            return Err(bad_request!("El código {} ya existe.", codigo));
        }

        if let Some(reservado) = id_de_codigo_generado(codigo).filter(|otro| *otro != id) {
            warn!("⚠️ 编码 {} 属于学生 {} 的生成编码", codigo, reservado);
            return Err(bad_request!(
                "El código {} está reservado para el estudiante {}.",
                codigo,
                reservado
            ));
        }

        Ok(())
    }
}

fn estudiante_no_encontrado(id: EstudianteId) -> AppError {
    not_found!("No se encontró el estudiante {}.", id)
}

/// 补丁路径映射到实体字段名（忽略大小写），无法识别时使用首个片段
fn field_for_path(path: &str) -> String {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    FIELDS
        .iter()
        .find(|f| f.eq_ignore_ascii_case(first))
        .map(|f| f.to_string())
        .unwrap_or_else(|| first.to_string())
}

/// 补丁后的文档转换回实体，未知成员或类型错误作为字段错误
fn estudiante_from_patched(doc: Value) -> AppResult<Estudiante> {
    let mut errors = ValidationErrors::new();

    match &doc {
        Value::Object(map) => {
            for key in map.keys().filter(|k| !FIELDS.contains(&k.as_str())) {
                errors.add(key.clone(), format!("La propiedad {} no existe en Estudiante.", key));
            }
        }
        _ => errors.add("Estudiante", "El documento resultante no es un objeto."),
    }
    errors.into_result()?;

    serde_json::from_value(doc).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("Estudiante", e.to_string());
        AppError::Validation(errors)
    })
}
