//! Work HTTP Handlers

use axum::{extract::State, Json};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::application::{BuildWork, DeleteWork, GetWorkTree, ListWorks};
use crate::infrastructure::http::dto::{
    ApiResponse, Empty, IdRequest, ImportWorkDto, ImportWorkRequest, WorkDto, WorkTreeDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 把请求中的相对路径解析到书库目录下
pub fn resolve_library_path(library_dir: &Path, requested: &str) -> Result<PathBuf, ApiError> {
    let relative = Path::new(requested.trim());
    if relative.as_os_str().is_empty() {
        return Err(ApiError::BadRequest("path must not be empty".to_string()));
    }
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ApiError::Forbidden(format!(
            "path must stay inside the library: {}",
            requested
        )));
    }
    Ok(library_dir.join(relative))
}

/// 列出所有作品
pub async fn list_works(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<WorkDto>>>, ApiError> {
    let works = state.list_works_handler.handle(ListWorks).await?;

    Ok(Json(ApiResponse::success(
        works.into_iter().map(WorkDto::from).collect(),
    )))
}

/// 导入书库中的一个 EPUB 文件（按文件名幂等）
pub async fn import_work(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportWorkRequest>,
) -> Result<Json<ApiResponse<ImportWorkDto>>, ApiError> {
    let path = resolve_library_path(&state.library_dir, &req.path)?;

    let response = state.build_work_handler.handle(BuildWork { path }).await?;

    tracing::info!(
        work_id = %response.work_id,
        created = response.created,
        "Import request completed"
    );

    Ok(Json(ApiResponse::success(ImportWorkDto::from(response))))
}

/// 删除作品及其全部内容文件
pub async fn delete_work(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_work_handler
        .handle(DeleteWork { work_id: req.id })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 获取作品的章节树
pub async fn work_tree(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<WorkTreeDto>>, ApiError> {
    let tree = state
        .get_work_tree_handler
        .handle(GetWorkTree { work_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(WorkTreeDto::from(tree))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_library_path() {
        let library = Path::new("/books");
        assert_eq!(
            resolve_library_path(library, "russian/besy.epub").unwrap(),
            PathBuf::from("/books/russian/besy.epub")
        );
        assert!(matches!(
            resolve_library_path(library, "../etc/passwd"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            resolve_library_path(library, "/etc/passwd"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            resolve_library_path(library, "  "),
            Err(ApiError::BadRequest(_))
        ));
    }
}
