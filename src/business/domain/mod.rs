//! 领域模型模块
//!
//! 定义业务领域的核心实体、只读视图、补丁操作和存储接口

pub mod estudiante;
pub mod json_patch;
pub mod matricula;
pub mod repo;

pub use estudiante::{generar_codigo, id_de_codigo_generado, Estudiante};
pub use json_patch::{PatchDocument, PatchError, PatchOperation};
pub use matricula::{
    Curso, EstudianteConMatriculas, EstudianteMatriculaInscripcionesVM, InscripcionCurso,
    InscripcionVM, Matricula, MatriculaVM, Periodo,
};
pub use repo::{CodigoFn, EstudianteStore};
