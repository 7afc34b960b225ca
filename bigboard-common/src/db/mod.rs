//! Persistence
//!
//! The board core only talks to storage through [`BoardStore`]. The store
//! hands out fully materialized copies; nothing holds references into it.

pub mod init;
pub mod sqlite;

pub use init::init_database;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::model::{Category, FamilyMember, Item, NewItem};
use crate::Result;

/// Durable storage for items, family members and categories
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Every stored item, ordered by date, time, title
    async fn list_items(&self) -> Result<Vec<Item>>;

    async fn get_item(&self, id: i64) -> Result<Option<Item>>;

    /// Store a new item and return it with its assigned id
    async fn insert_item(&self, item: NewItem) -> Result<Item>;

    /// Overwrite an existing item; `false` when the id is unknown
    async fn save_item(&self, item: &Item) -> Result<bool>;

    /// `false` when the id is unknown
    async fn delete_item(&self, id: i64) -> Result<bool>;

    /// Look up a member, creating it with the next palette color if unseen
    async fn get_or_create_member(&self, name: &str) -> Result<FamilyMember>;

    /// Members ordered by name
    async fn list_members(&self) -> Result<Vec<FamilyMember>>;

    /// `None` when no member has that name
    async fn set_member_color(&self, name: &str, color: &str) -> Result<Option<FamilyMember>>;

    /// Categories ordered by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Idempotent: adding an existing name returns it unchanged
    async fn add_category(&self, name: &str) -> Result<Category>;

    /// `false` when no category has that name. Items are never touched.
    async fn delete_category(&self, name: &str) -> Result<bool>;

    /// Remove everything and re-seed the default categories
    async fn clear_all(&self) -> Result<()>;
}
