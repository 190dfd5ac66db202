//! Character HTTP Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::application::{GetCharacterMentions, ListCharacters};
use crate::infrastructure::http::dto::{
    ApiResponse, CharacterDto, CharacterMentionsDto, CharacterMentionsRequest,
    ListCharactersRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogReloadDto {
    pub works: usize,
}

/// 列出作品的人物
pub async fn list_characters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListCharactersRequest>,
) -> Result<Json<ApiResponse<Vec<CharacterDto>>>, ApiError> {
    let characters = state
        .list_characters_handler
        .handle(ListCharacters {
            work_id: req.work_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        characters.into_iter().map(CharacterDto::from).collect(),
    )))
}

/// 人物的提及（可限定到某章为止）
pub async fn character_mentions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CharacterMentionsRequest>,
) -> Result<Json<ApiResponse<CharacterMentionsDto>>, ApiError> {
    let response = state
        .get_character_mentions_handler
        .handle(GetCharacterMentions {
            character_id: req.character_id,
            up_to_chapter: req.up_to_chapter,
        })
        .await?;

    Ok(Json(ApiResponse::success(CharacterMentionsDto::from(
        response,
    ))))
}

/// 重新读取人物名录（只影响之后导入的作品）
pub async fn reload_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CatalogReloadDto>>, ApiError> {
    let works = state
        .catalog
        .reload()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(ApiResponse::success(CatalogReloadDto { works })))
}
