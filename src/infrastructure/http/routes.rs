//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/work/list            GET   列出所有作品
//! - /api/work/import          POST  导入书库中的 EPUB
//! - /api/work/delete          POST  删除作品
//! - /api/work/tree            POST  获取章节树
//! - /api/chapter/read         POST  阅读章节（高亮 + 导航）
//! - /api/chapter/content      POST  获取章节原始正文
//! - /api/chapter/navigation   POST  上一章 / 下一章
//! - /api/chapter/reprocess    POST  强制重新检测人物提及
//! - /api/character/list       POST  列出作品人物
//! - /api/character/mentions   POST  人物提及
//! - /api/character/reload     POST  重新读取人物名录

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/work", work_routes())
        .nest("/chapter", chapter_routes())
        .nest("/character", character_routes())
}

/// Work 路由
fn work_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_works))
        .route("/import", post(handlers::import_work))
        .route("/delete", post(handlers::delete_work))
        .route("/tree", post(handlers::work_tree))
}

/// Chapter 路由
fn chapter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/read", post(handlers::read_chapter))
        .route("/content", post(handlers::chapter_content))
        .route("/navigation", post(handlers::chapter_navigation))
        .route("/reprocess", post(handlers::reprocess_chapter))
}

/// Character 路由
fn character_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(handlers::list_characters))
        .route("/mentions", post(handlers::character_mentions))
        .route("/reload", post(handlers::reload_catalog))
}
