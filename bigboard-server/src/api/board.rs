//! Current board endpoint

use axum::{extract::State, Json};
use bigboard_common::events::BoardSnapshot;

use super::error::ApiResult;
use crate::AppState;

/// GET /api/board
///
/// The same payload viewers receive over `/api/events`, minus the `type` tag.
pub async fn get_board(State(state): State<AppState>) -> ApiResult<Json<BoardSnapshot>> {
    Ok(Json(state.board.current_board().await?))
}
