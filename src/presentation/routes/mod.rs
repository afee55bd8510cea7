//! 路由配置模块
//!
//! 组织和配置所有HTTP路由

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::middleware::auth_middleware;
use crate::auth::JwtService;
use crate::business::services::{EstudianteService, SharedEstudianteService};
use crate::infrastructure::config::AuthConfig;
use crate::infrastructure::Database;
use crate::presentation::handlers;

/// 学生资源的路由前缀
pub const ESTUDIANTES_BASE: &str = "/estudiantes";

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub estudiantes: SharedEstudianteService,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(database: Database, auth: &AuthConfig) -> Self {
        let estudiantes: SharedEstudianteService =
            Arc::new(EstudianteService::new(database.estudiantes()));
        Self {
            database,
            estudiantes,
            jwt: Arc::new(JwtService::from_config(auth)),
        }
    }
}

/// 创建应用路由
pub fn create_routes(state: AppState) -> Router {
    // 需要JWT认证的学生路由
    let estudiantes_routes = Router::new()
        .route(
            "/",
            get(handlers::estudiantes::list_estudiantes).post(handlers::estudiantes::create_estudiante),
        )
        .route(
            "/:id",
            get(handlers::estudiantes::get_estudiante)
                .put(handlers::estudiantes::update_estudiante)
                .patch(handlers::estudiantes::patch_estudiante)
                .delete(handlers::estudiantes::delete_estudiante),
        )
        .route(
            "/CambiarCodigo/:id",
            patch(handlers::estudiantes::cambiar_codigo),
        )
        .route(
            "/matricula/:id",
            get(handlers::estudiantes::matriculas_inscripciones),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 公开路由
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    Router::new()
        .merge(public_routes)
        .nest(ESTUDIANTES_BASE, estudiantes_routes)
        .with_state(state)
        // 全局中间件
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
