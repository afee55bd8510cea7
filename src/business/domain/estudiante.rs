//! 学生领域模型
//!
//! 学生实体、字段约束校验以及编码生成规则

use serde::{Deserialize, Deserializer, Serialize};

use crate::shared::constants::{codigo, estudiante};
use crate::shared::{AppResult, EstudianteId, ValidationErrors};

/// 学生实体
///
/// `id_estudiante` 为 0 表示尚未由存储分配。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Estudiante {
    #[serde(default)]
    pub id_estudiante: EstudianteId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub codigo: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombres: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub apellidos: String,
}

/// JSON 字段名（与序列化保持一致）
pub const FIELD_ID: &str = "idEstudiante";
pub const FIELD_CODIGO: &str = "codigo";
pub const FIELD_NOMBRES: &str = "nombres";
pub const FIELD_APELLIDOS: &str = "apellidos";

/// 实体允许出现的全部字段
pub const FIELDS: [&str; 4] = [FIELD_ID, FIELD_CODIGO, FIELD_NOMBRES, FIELD_APELLIDOS];

impl Estudiante {
    /// 完整姓名
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombres.trim(), self.apellidos.trim())
            .trim()
            .to_string()
    }

    /// 收集整个模型的字段错误
    pub fn validation_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        check_required(&mut errors, FIELD_NOMBRES, &self.nombres);
        check_max_length(&mut errors, FIELD_NOMBRES, &self.nombres, estudiante::NOMBRES_MAX_LENGTH);
        check_required(&mut errors, FIELD_APELLIDOS, &self.apellidos);
        check_max_length(&mut errors, FIELD_APELLIDOS, &self.apellidos, estudiante::APELLIDOS_MAX_LENGTH);
        // 编码在首次保存前为空，只限制长度
        check_max_length(&mut errors, FIELD_CODIGO, &self.codigo, codigo::MAX_LENGTH);

        errors
    }

    /// 校验整个模型
    pub fn validate(&self) -> AppResult<()> {
        self.validation_errors().into_result()
    }
}

/// 根据存储分配的ID生成学生编码，例如 42 -> `EST0000042`
pub fn generar_codigo(id: EstudianteId) -> String {
    format!("{}{:0>width$}", codigo::PREFIX, id, width = codigo::PAD_WIDTH)
}

/// 若编码正好是某个ID的生成编码，返回该ID
///
/// 仅识别 `generar_codigo` 的规范形式，`EST9` 或 `EST00000002` 不算。
pub fn id_de_codigo_generado(codigo: &str) -> Option<EstudianteId> {
    let digits = codigo.strip_prefix(codigo::PREFIX)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: EstudianteId = digits.parse().ok()?;
    (id > 0 && generar_codigo(id) == codigo).then_some(id)
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("El campo {} es obligatorio.", field));
    }
}

fn check_max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("El campo {} debe tener como máximo {} caracteres.", field, max),
        );
    }
}

/// `null` 反序列化为空字符串，交由校验报告必填错误
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
