//! Item endpoints
//!
//! - `GET /api/items`: all stored items, or the resolved board for
//!   `?date=` / every date in `?date_from=&date_to=`
//! - `POST /api/items`: create
//! - `GET|PUT|DELETE /api/items/:id`
//! - `POST /api/items/:id/handle?handled=`: mark (un)handled

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use bigboard_common::model::{parse_date, Item, ItemDraft, ItemPatch};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use crate::board::AgendaDay;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ItemsResponse {
    Items { items: Vec<Item> },
    Agenda { days: Vec<AgendaDay> },
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub status: &'static str,
    pub item: Item,
}

impl ItemResponse {
    fn ok(item: Item) -> Json<Self> {
        Json(Self { status: "ok", item })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct HandleQuery {
    #[serde(default = "default_handled")]
    pub handled: bool,
}

fn default_handled() -> bool {
    true
}

/// GET /api/items
pub async fn list_items(
    State(state): State<AppState>,
    query: Result<Query<ItemsQuery>, QueryRejection>,
) -> ApiResult<Json<ItemsResponse>> {
    let Query(query) = query?;

    let response = match (query.date, query.date_from, query.date_to) {
        (Some(date), None, None) => ItemsResponse::Items {
            items: state.board.board_for(parse_date(&date)?).await?,
        },
        (None, Some(from), Some(to)) => ItemsResponse::Agenda {
            days: state
                .board
                .agenda(parse_date(&from)?, parse_date(&to)?)
                .await?,
        },
        (None, None, None) => ItemsResponse::Items {
            items: state.board.list_items().await?,
        },
        _ => {
            return Err(ApiError::BadRequest(
                "use either date, or both date_from and date_to".to_string(),
            ))
        }
    };

    Ok(Json(response))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let Json(draft) = payload?;
    let item = state.board.create_item(draft).await?;
    Ok((StatusCode::CREATED, ItemResponse::ok(item)))
}

/// GET /api/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    Ok(ItemResponse::ok(state.board.get_item(id).await?))
}

/// PUT /api/items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> ApiResult<Json<ItemResponse>> {
    let Json(patch) = payload?;
    Ok(ItemResponse::ok(state.board.update_item(id, patch).await?))
}

/// DELETE /api/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    if state.board.delete_item(id).await? {
        Ok(Json(StatusResponse { status: "ok" }))
    } else {
        Err(ApiError::NotFound(format!("item {}", id)))
    }
}

/// POST /api/items/:id/handle
pub async fn mark_handled(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: Result<Query<HandleQuery>, QueryRejection>,
) -> ApiResult<Json<ItemResponse>> {
    let Query(HandleQuery { handled }) = query?;
    Ok(ItemResponse::ok(state.board.mark_handled(id, handled).await?))
}
