//! Category endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use bigboard_common::model::Category;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::items::StatusResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub status: &'static str,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<CategoriesResponse>> {
    let categories = state.board.list_categories().await?;
    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(|c| c.name).collect(),
    }))
}

/// POST /api/categories?name=
pub async fn create_category(
    State(state): State<AppState>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let Query(NameQuery { name }) = query?;
    let category = state.board.add_category(&name).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            status: "ok",
            category,
        }),
    ))
}

/// DELETE /api/categories/:name
pub async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    state.board.delete_category(&name).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}
