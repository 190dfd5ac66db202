//! Chapter HTTP Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{EnsureMentions, GetChapterContent, GetNavigation, ReadChapter};
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterContentDto, IdRequest, NavigationDto, ReadChapterDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 重新检测的结果
#[derive(Debug, Serialize)]
pub struct ReprocessDto {
    pub id: Uuid,
    pub mentions: usize,
}

/// 阅读章节：高亮正文 + 导航，首次阅读时检测人物提及
pub async fn read_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<ReadChapterDto>>, ApiError> {
    let response = state
        .read_chapter_handler
        .handle(ReadChapter { chapter_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(ReadChapterDto::from(response))))
}

/// 获取章节清洗后的原始正文
pub async fn chapter_content(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<ChapterContentDto>>, ApiError> {
    let response = state
        .get_chapter_content_handler
        .handle(GetChapterContent { chapter_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(ChapterContentDto::from(response))))
}

/// 上一章 / 下一章
pub async fn chapter_navigation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<NavigationDto>>, ApiError> {
    let navigation = state
        .get_navigation_handler
        .handle(GetNavigation { chapter_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(NavigationDto::from(navigation))))
}

/// 强制重新检测章节的人物提及
pub async fn reprocess_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<ReprocessDto>>, ApiError> {
    let content = state
        .get_chapter_content_handler
        .handle(GetChapterContent { chapter_id: req.id })
        .await?;

    let response = state
        .ensure_mentions_handler
        .handle(EnsureMentions {
            chapter_id: req.id,
            markup: content.markup,
            force: true,
        })
        .await?;

    Ok(Json(ApiResponse::success(ReprocessDto {
        id: response.chapter_id,
        mentions: response.mention_count,
    })))
}
