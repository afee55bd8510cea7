//! 学生存储接口

use async_trait::async_trait;

use super::{Estudiante, EstudianteConMatriculas};
use crate::shared::{AppResult, EstudianteId};

/// 根据存储分配的ID计算编码的函数
pub type CodigoFn = fn(EstudianteId) -> String;

/// 学生记录存储
///
/// 编码唯一性冲突由实现转换为 `AppError::BadRequest`。
#[async_trait]
pub trait EstudianteStore: Send + Sync {
    /// 全部学生，不分页
    async fn list(&self) -> AppResult<Vec<Estudiante>>;

    async fn find_by_id(&self, id: EstudianteId) -> AppResult<Option<Estudiante>>;

    /// 只检查是否存在，不加载实体
    async fn exists(&self, id: EstudianteId) -> AppResult<bool>;

    /// 两阶段创建：先插入获得ID，再用 `codigo_for(id)` 写入编码
    async fn insert_with_codigo(&self, estudiante: &Estudiante, codigo_for: CodigoFn) -> AppResult<Estudiante>;

    /// 整体更新，目标不存在时返回 false
    async fn update(&self, estudiante: &Estudiante) -> AppResult<bool>;

    /// 删除，目标不存在时返回 false
    async fn delete(&self, id: EstudianteId) -> AppResult<bool>;

    /// 编码是否已被其他学生占用
    async fn codigo_in_use(&self, codigo: &str, except: EstudianteId) -> AppResult<bool>;

    /// 加载学生及其注册、选课、课程和学期
    async fn load_matriculas(&self, id: EstudianteId) -> AppResult<Option<EstudianteConMatriculas>>;
}
