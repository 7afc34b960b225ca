//! Family member endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use bigboard_common::model::FamilyMember;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub family_members: Vec<FamilyMember>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub status: &'static str,
    pub family_member: FamilyMember,
}

#[derive(Debug, Deserialize)]
pub struct ColorQuery {
    pub color: String,
}

/// GET /api/family-members
pub async fn list_members(State(state): State<AppState>) -> ApiResult<Json<MembersResponse>> {
    Ok(Json(MembersResponse {
        family_members: state.board.list_members().await?,
    }))
}

/// PUT /api/family-members/:name/color?color=%23RRGGBB
pub async fn update_member_color(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: Result<Query<ColorQuery>, QueryRejection>,
) -> ApiResult<Json<MemberResponse>> {
    let Query(ColorQuery { color }) = query?;
    let member = state.board.update_member_color(&name, &color).await?;
    Ok(Json(MemberResponse {
        status: "ok",
        family_member: member,
    }))
}
