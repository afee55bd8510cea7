//! 课程学生管理服务主入口
//!
//! 学生档案 REST 服务，支持 PostgreSQL 与内存存储

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cursos_estudiantes::{create_routes, AppState, Config, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志 - 默认INFO等级，便于生产环境使用
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cursos_estudiantes=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载环境变量
    dotenv::dotenv().ok();

    info!("🚀 启动课程学生管理服务");

    // 加载配置
    let config = Config::load()?;
    info!("✅ 配置加载成功 (存储后端: {:?})", config.storage);

    // 初始化数据库连接
    let database = Database::new(&config).await?;
    info!("✅ 数据库初始化成功");

    // 数据库迁移
    if config.database.run_migrations {
        database.run_migrations().await?;
        info!("✅ 数据库迁移执行完成");
    } else if database.check_migrations().await? {
        info!("✅ 数据库迁移检查通过");
    } else {
        warn!("⚠️ 数据库表未找到，请设置 DB_RUN_MIGRATIONS=true 或手动运行 sqlx migrate run");
    }

    // 创建路由
    let state = AppState::new(database.clone(), &config.auth);
    let app = create_routes(state);
    info!("✅ 路由创建成功");

    // 启动服务器
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!("🌐 服务器启动成功，监听地址: {}", address);
    info!("📖 健康检查: http://localhost:{}/health", config.server.port);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>()
    )
    .tcp_nodelay(true)
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 接收到关闭信号，正在优雅关闭服务器...");
    });

    server.await?;

    database.close().await;
    info!("👋 服务已停止");

    Ok(())
}
