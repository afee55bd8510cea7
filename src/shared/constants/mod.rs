//! 常量定义模块

/// 学生编码相关常量
pub mod codigo {
    /// 自动生成编码的固定前缀
    pub const PREFIX: &str = "EST";
    /// 编号补零宽度
    pub const PAD_WIDTH: usize = 7;
    /// 编码最大长度（前缀 + 7位数字）
    pub const MAX_LENGTH: usize = 10;
}

/// 学生字段约束
pub mod estudiante {
    pub const NOMBRES_MAX_LENGTH: usize = 50;
    pub const APELLIDOS_MAX_LENGTH: usize = 50;
}

/// JWT相关常量
pub mod jwt {
    pub const DEFAULT_ISSUER: &str = "cursos-estudiantes";
    pub const JWT_SECRET_MIN_LENGTH: usize = 32;
}

/// 数据库相关常量
pub mod database {
    /// PostgreSQL 唯一约束冲突错误码
    pub const UNIQUE_VIOLATION: &str = "23505";
    /// 学生编码唯一索引名
    pub const CODIGO_UNIQUE_INDEX: &str = "estudiante_codigo_key";
}
