//! HTTP API handlers

pub mod board;
pub mod categories;
pub mod commands;
pub mod error;
pub mod health;
pub mod items;
pub mod members;
pub mod sse;
pub mod tools;

pub use board::get_board;
pub use categories::{create_category, delete_category, list_categories};
pub use commands::post_command;
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use items::{create_item, delete_item, get_item, list_items, mark_handled, update_item};
pub use members::{list_members, update_member_color};
pub use sse::event_stream;
pub use tools::{call_tool, list_tools};
