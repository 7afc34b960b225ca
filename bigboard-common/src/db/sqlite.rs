//! SQLite-backed board store

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{debug, info, warn};

use super::init::{init_database, seed_default_categories};
use super::BoardStore;
use crate::model::{
    palette_color, parse_date, parse_optional_time, Category, FamilyMember, Item, NewItem,
    Recurrence, DATE_FORMAT, TIME_FORMAT,
};
use crate::{Error, Result};

const ITEM_COLUMNS: &str = "id, title, family_member, date, time, category, recurrence, \
                            recurrence_day, handled, handled_date, stay_until_done";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(init_database(db_path).await?))
    }
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let id: i64 = row.try_get("id")?;
    let occurs_on = parse_date(&row.try_get::<String, _>("date")?)
        .map_err(|e| Error::Internal(format!("item {} has unreadable date: {}", id, e)))?;

    // unreadable optional fields are dropped so one bad row cannot hide the board
    let time_of_day = readable(
        id,
        "time",
        parse_optional_time(row.try_get::<Option<String>, _>("time")?.as_deref()),
    )
    .flatten();
    let recurrence = Recurrence::parse_optional(
        row.try_get::<Option<String>, _>("recurrence")?.as_deref(),
    )
    .unwrap_or_else(|e| {
        warn!("Item {} has unreadable recurrence, ignoring it: {}", id, e);
        None
    });

    let handled = row.try_get::<i64, _>("handled")? != 0;
    let handled_on = match row.try_get::<Option<String>, _>("handled_date")? {
        Some(raw) if handled => readable(id, "handled_date", parse_date(&raw)),
        _ => None,
    };

    Ok(Item {
        id,
        title: row.try_get("title")?,
        owner: row.try_get("family_member")?,
        occurs_on,
        time_of_day,
        category: row.try_get("category")?,
        // a rule-less item never carries a rule day
        recurrence_day: recurrence.filter(Recurrence::takes_day).and(
            row.try_get::<Option<i64>, _>("recurrence_day")?
                .and_then(|d| u8::try_from(d).ok()),
        ),
        recurrence,
        // a handled row without a date cannot be trusted as handled
        handled: handled && handled_on.is_some(),
        handled_on,
        stay_until_done: row.try_get::<i64, _>("stay_until_done")? != 0,
    })
}

fn readable<T>(id: i64, field: &str, parsed: Result<T>) -> Option<T> {
    parsed
        .map_err(|e| warn!("Item {} has unreadable {}, ignoring it: {}", id, field, e))
        .ok()
}

fn format_time(item_time: Option<chrono::NaiveTime>) -> Option<String> {
    item_time.map(|t| t.format(TIME_FORMAT).to_string())
}

#[async_trait]
impl BoardStore for SqliteStore {
    async fn list_items(&self) -> Result<Vec<Item>> {
        let query = format!(
            "SELECT {} FROM items ORDER BY date, time IS NULL, time, title",
            ITEM_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .filter_map(|row| match item_from_row(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping unreadable item row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let query = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(item_from_row)
            .transpose()
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (title, family_member, date, time, category,
                               recurrence, recurrence_day, stay_until_done)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.title)
        .bind(&item.owner)
        .bind(item.occurs_on.format(DATE_FORMAT).to_string())
        .bind(format_time(item.time_of_day))
        .bind(&item.category)
        .bind(item.recurrence.map(|r| r.as_str()))
        .bind(item.recurrence_day.map(i64::from))
        .bind(item.stay_until_done as i64)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted item {} '{}'", id, item.title);

        Ok(Item {
            id,
            title: item.title,
            owner: item.owner,
            occurs_on: item.occurs_on,
            time_of_day: item.time_of_day,
            category: item.category,
            recurrence: item.recurrence,
            recurrence_day: item.recurrence_day,
            stay_until_done: item.stay_until_done,
            handled: false,
            handled_on: None,
        })
    }

    async fn save_item(&self, item: &Item) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET title = ?, family_member = ?, date = ?, time = ?, category = ?,
                recurrence = ?, recurrence_day = ?, handled = ?, handled_date = ?,
                stay_until_done = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.owner)
        .bind(item.occurs_on.format(DATE_FORMAT).to_string())
        .bind(format_time(item.time_of_day))
        .bind(&item.category)
        .bind(item.recurrence.map(|r| r.as_str()))
        .bind(item.recurrence_day.map(i64::from))
        .bind(item.handled as i64)
        .bind(item.handled_on.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(item.stay_until_done as i64)
        .bind(item.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_member(&self, name: &str) -> Result<FamilyMember> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT color FROM family_members WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(color) = existing {
            return Ok(FamilyMember {
                name: name.to_string(),
                color,
            });
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM family_members")
            .fetch_one(&self.pool)
            .await?;
        let color = palette_color(count as usize);

        // OR IGNORE: a concurrent creator may have won; re-read below either way
        sqlx::query("INSERT OR IGNORE INTO family_members (name, color) VALUES (?, ?)")
            .bind(name)
            .bind(color)
            .execute(&self.pool)
            .await?;

        let color: String = sqlx::query_scalar("SELECT color FROM family_members WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        info!("Family member '{}' created with color {}", name, color);

        Ok(FamilyMember {
            name: name.to_string(),
            color,
        })
    }

    async fn list_members(&self) -> Result<Vec<FamilyMember>> {
        let rows = sqlx::query("SELECT name, color FROM family_members ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(FamilyMember {
                    name: row.try_get("name")?,
                    color: row.try_get("color")?,
                })
            })
            .collect()
    }

    async fn set_member_color(&self, name: &str, color: &str) -> Result<Option<FamilyMember>> {
        let result = sqlx::query("UPDATE family_members SET color = ? WHERE name = ?")
            .bind(color)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then(|| FamilyMember {
            name: name.to_string(),
            color: color.to_string(),
        }))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().map(|name| Category { name }).collect())
    }

    async fn add_category(&self, name: &str) -> Result<Category> {
        sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(Category {
            name: name.to_string(),
        })
    }

    async fn delete_category(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM family_members").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
        seed_default_categories(&mut *tx).await?;
        tx.commit().await?;

        info!("Board database cleared");
        Ok(())
    }
}
