//! # Big Board Common Library
//!
//! Shared code for the Big Board household schedule:
//! - Domain model (items, family members, categories)
//! - Recurrence matching and the visibility resolver
//! - Display clock (evening rollover to tomorrow's board)
//! - Board snapshot and viewer command types
//! - Persistence (`BoardStore` trait and the SQLite store)
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod model;
pub mod recurrence;
pub mod visibility;

pub use error::{Error, Result};
