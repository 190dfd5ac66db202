//! Folio - 俄语小说阅读与人物追踪服务

use std::sync::Arc;

use folio::config::{load_config, print_config, AppConfig};
use folio::infrastructure::adapters::{EpubDocumentSource, FileContentStore, JsonCharacterCatalog};
use folio::infrastructure::http::{AppPorts, AppState, HttpServer, ServerConfig};
use folio::infrastructure::memory::InMemoryChapterLocks;
use folio::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteMentionRepository, SqliteWorkRepository,
};
use folio::infrastructure::worker::LibraryScanner;

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.filter_directive()));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Folio - 俄语小说阅读与人物追踪服务");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 端口适配器
    let content_store = FileContentStore::new(&config.storage.content_root).await?;
    let catalog = JsonCharacterCatalog::load(&config.storage.catalog_path).await?;

    let ports = AppPorts {
        work_repo: Arc::new(SqliteWorkRepository::new(pool.clone())),
        mention_repo: Arc::new(SqliteMentionRepository::new(pool.clone())),
        content_store: Arc::new(content_store),
        document_source: Arc::new(EpubDocumentSource::new()),
        catalog: Arc::new(catalog),
        chapter_locks: InMemoryChapterLocks::new().arc(),
    };

    let state = AppState::new(
        ports,
        config.ingest.books_dir.clone(),
        config.mentions.retry_delay(),
    );

    if config.ingest.scan_on_startup {
        LibraryScanner::new(&config.ingest.books_dir)
            .scan(&state.build_work_handler)
            .await;
    }

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    pool.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
