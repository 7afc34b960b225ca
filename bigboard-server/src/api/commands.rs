//! Inbound viewer commands
//!
//! The SSE feed is one-way, so viewers post their commands here. A body that
//! does not parse, or a command that fails, is logged and acknowledged
//! anyway: a bad message never breaks a viewer's feed.

use axum::{body::Bytes, extract::State, http::StatusCode};
use bigboard_common::events::ClientCommand;
use tracing::warn;

use crate::board::log_command_error;
use crate::AppState;

/// POST /api/events/commands
pub async fn post_command(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<ClientCommand>(&body) {
        Ok(command) => {
            if let Err(e) = state.board.handle_command(command).await {
                log_command_error(&e);
            }
        }
        Err(e) => warn!(
            "Ignoring malformed viewer command ({}): {}",
            e,
            String::from_utf8_lossy(&body)
        ),
    }
    StatusCode::ACCEPTED
}
