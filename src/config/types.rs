//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 书库导入配置
    #[serde(default)]
    pub ingest: IngestConfig,

    /// 人物提及检测配置
    #[serde(default)]
    pub mentions: MentionsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/folio.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 章节内容与封面的根目录
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,

    /// 人物名录 JSON 文件
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_content_root() -> PathBuf {
    PathBuf::from("data/content")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/characters.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// 书库导入配置
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// 启动时扫描书库目录并导入所有 EPUB
    #[serde(default)]
    pub scan_on_startup: bool,

    /// 书库目录，HTTP 导入请求中的路径也相对于此目录
    #[serde(default = "default_books_dir")]
    pub books_dir: PathBuf,
}

fn default_books_dir() -> PathBuf {
    PathBuf::from("data/books")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            scan_on_startup: false,
            books_dir: default_books_dir(),
        }
    }
}

/// 人物提及检测配置
#[derive(Debug, Clone, Deserialize)]
pub struct MentionsConfig {
    /// 数据库忙时重试前的等待（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl MentionsConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// 默认的 EnvFilter 指令
    pub fn filter_directive(&self) -> String {
        format!("{},folio={},tower_http=debug", self.level, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "127.0.0.1:5070");
        assert_eq!(config.database.path, "data/folio.db");
        assert_eq!(config.storage.content_root, PathBuf::from("data/content"));
        assert!(!config.ingest.scan_on_startup);
        assert_eq!(config.mentions.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/folio.db?mode=rwc");
    }

    #[test]
    fn test_filter_directive() {
        let log = LogConfig {
            level: "debug".to_string(),
            json: true,
        };
        assert_eq!(log.filter_directive(), "debug,folio=debug,tower_http=debug");
    }
}
