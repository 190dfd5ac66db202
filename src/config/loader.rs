//! Configuration Loader
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `FOLIO_SERVER__PORT=8080`
/// - `FOLIO_STORAGE__CONTENT_ROOT=/srv/folio/content`
/// - `FOLIO_INGEST__SCAN_ON_STARTUP=true`
/// - `FOLIO_MENTIONS__RETRY_DELAY_MS=250`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置，`None` 时搜索默认文件名
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5070)?
        .set_default("database.path", "data/folio.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.content_root", "data/content")?
        .set_default("storage.catalog_path", "data/characters.json")?
        .set_default("ingest.scan_on_startup", false)?
        .set_default("ingest.books_dir", "data/books")?
        .set_default("mentions.retry_delay_ms", 1000)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: FOLIO_LOG__LEVEL=debug
    builder = builder.add_source(
        Environment::with_prefix("FOLIO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let app_config: AppConfig = builder
        .build()?
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.storage.content_root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Content root cannot be empty".to_string(),
        ));
    }

    if config.ingest.scan_on_startup && config.ingest.books_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Books directory cannot be empty when scanning on startup".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Content Root: {:?}", config.storage.content_root);
    tracing::info!("Character Catalog: {:?}", config.storage.catalog_path);
    tracing::info!("Books Directory: {:?}", config.ingest.books_dir);
    tracing::info!("Scan On Startup: {}", config.ingest.scan_on_startup);
    tracing::info!("Mention Retry Delay: {}ms", config.mentions.retry_delay_ms);
    tracing::info!("Log Level: {} (json: {})", config.log.level, config.log.json);
    tracing::info!("=================================");
}
