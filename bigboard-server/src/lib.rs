//! bigboard-server library
//!
//! Keeps every connected display in sync with the household board: the
//! broadcast hub, the board service that all changes go through, the
//! tool-call façade, and the HTTP/SSE surface.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod board;
pub mod hub;
pub mod tools;

use board::BoardService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardService>,
}

impl AppState {
    pub fn new(board: Arc<BoardService>) -> Self {
        Self { board }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        // Board and live feed
        .route("/api/board", get(api::get_board))
        .route("/api/events", get(api::event_stream))
        .route("/api/events/commands", post(api::post_command))
        // Items
        .route("/api/items", get(api::list_items).post(api::create_item))
        .route(
            "/api/items/:id",
            get(api::get_item)
                .put(api::update_item)
                .delete(api::delete_item),
        )
        .route("/api/items/:id/handle", post(api::mark_handled))
        // Family members
        .route("/api/family-members", get(api::list_members))
        .route(
            "/api/family-members/:name/color",
            put(api::update_member_color),
        )
        // Categories
        .route(
            "/api/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route(
            "/api/categories/:name",
            delete(api::delete_category),
        )
        // Tool-call façade
        .route("/api/tools", get(api::list_tools))
        .route("/api/tools/call", post(api::call_tool));

    Router::new()
        .merge(routes)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
