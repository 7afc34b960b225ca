//! SQLite store tests
//!
//! Each test opens a fresh database in its own temporary directory.

use bigboard_common::db::{init_database, BoardStore, SqliteStore};
use bigboard_common::model::{NewItem, Recurrence, DEFAULT_CATEGORIES, MEMBER_PALETTE};
use bigboard_common::visibility::resolve;
use chrono::{NaiveDate, NaiveTime};
use tempfile::TempDir;

async fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(&dir.path().join("board").join("big_board.db"))
        .await
        .expect("open store");
    (dir, store)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_item(title: &str, owner: &str, occurs_on: NaiveDate) -> NewItem {
    NewItem {
        title: title.to_string(),
        owner: owner.to_string(),
        occurs_on,
        time_of_day: None,
        category: "Task".to_string(),
        recurrence: None,
        recurrence_day: None,
        stay_until_done: false,
    }
}

#[tokio::test]
async fn test_database_created_with_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("big_board.db");
    assert!(!db_path.exists());

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_reopening_existing_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("big_board.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    store.add_category("Chores").await.unwrap();
    drop(store);

    let store = SqliteStore::open(&db_path).await.unwrap();
    let names: Vec<String> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Chores".to_string()));
    assert_eq!(names.len(), DEFAULT_CATEGORIES.len() + 1);
}

#[tokio::test]
async fn test_default_categories_seeded_sorted() {
    let (_dir, store) = open_store().await;
    let names: Vec<String> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Activity", "Meeting", "Reminder", "School", "Task"]);
}

#[tokio::test]
async fn test_insert_and_read_back_item() {
    let (_dir, store) = open_store().await;
    let mut item = new_item("Pickup", "Dad", date(2024, 1, 1));
    item.time_of_day = NaiveTime::from_hms_opt(15, 0, 0);
    item.recurrence = Some(Recurrence::Weekly);
    item.recurrence_day = Some(0);

    let created = store.insert_item(item).await.unwrap();
    assert!(created.id > 0);
    assert!(!created.handled);

    let loaded = store.get_item(created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(store.get_item(created.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_item_persists_handled_state() {
    let (_dir, store) = open_store().await;
    let mut item = store
        .insert_item(new_item("Vitamins", "Mom", date(2024, 1, 1)))
        .await
        .unwrap();

    item.set_handled(true, date(2024, 1, 2));
    assert!(store.save_item(&item).await.unwrap());

    let loaded = store.get_item(item.id).await.unwrap().unwrap();
    assert!(loaded.handled);
    assert_eq!(loaded.handled_on, Some(date(2024, 1, 2)));

    item.id += 1000;
    assert!(!store.save_item(&item).await.unwrap());
}

#[tokio::test]
async fn test_delete_item_reports_existence() {
    let (_dir, store) = open_store().await;
    let item = store
        .insert_item(new_item("Dentist", "Mom", date(2024, 1, 3)))
        .await
        .unwrap();

    assert!(store.delete_item(item.id).await.unwrap());
    assert!(!store.delete_item(item.id).await.unwrap());
    assert!(store.list_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_member_colors_cycle_through_palette() {
    let (_dir, store) = open_store().await;
    let mut colors = Vec::new();
    for i in 0..9 {
        colors.push(store.get_or_create_member(&format!("Kid {}", i)).await.unwrap().color);
    }
    assert_eq!(colors[0], MEMBER_PALETTE[0]);
    assert_eq!(colors[7], MEMBER_PALETTE[7]);
    assert_eq!(colors[8], MEMBER_PALETTE[0]);

    // existing members keep their color
    let again = store.get_or_create_member("Kid 3").await.unwrap();
    assert_eq!(again.color, MEMBER_PALETTE[3]);
    assert_eq!(store.list_members().await.unwrap().len(), 9);
}

#[tokio::test]
async fn test_member_color_update() {
    let (_dir, store) = open_store().await;
    store.get_or_create_member("Emma").await.unwrap();

    let updated = store.set_member_color("Emma", "#123456").await.unwrap();
    assert_eq!(updated.unwrap().color, "#123456");
    assert!(store.set_member_color("Nobody", "#123456").await.unwrap().is_none());

    let members = store.list_members().await.unwrap();
    assert_eq!(members[0].color, "#123456");
}

#[tokio::test]
async fn test_category_add_is_idempotent_and_delete_reports() {
    let (_dir, store) = open_store().await;
    store.add_category("Chores").await.unwrap();
    store.add_category("Chores").await.unwrap();
    assert_eq!(store.list_categories().await.unwrap().len(), DEFAULT_CATEGORIES.len() + 1);

    assert!(store.delete_category("Chores").await.unwrap());
    assert!(!store.delete_category("Chores").await.unwrap());
}

#[tokio::test]
async fn test_deleting_category_leaves_items_visible() {
    let (_dir, store) = open_store().await;
    let mut homework = new_item("Homework", "Emma", date(2024, 1, 3));
    homework.category = "School".to_string();
    let created = store.insert_item(homework).await.unwrap();

    assert!(store.delete_category("School").await.unwrap());

    let items = store.list_items().await.unwrap();
    let resolved = resolve(&items, date(2024, 1, 3));
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, created.id);
    assert_eq!(resolved[0].category, "School");
}

#[tokio::test]
async fn test_list_items_ordering() {
    let (_dir, store) = open_store().await;
    let mut late = new_item("Late", "Dad", date(2024, 1, 1));
    late.time_of_day = NaiveTime::from_hms_opt(20, 0, 0);
    let untimed = new_item("Anytime", "Dad", date(2024, 1, 1));
    let mut early = new_item("Early", "Dad", date(2024, 1, 1));
    early.time_of_day = NaiveTime::from_hms_opt(6, 0, 0);
    let tomorrow = new_item("Tomorrow", "Dad", date(2024, 1, 2));

    for item in [tomorrow, untimed, late, early] {
        store.insert_item(item).await.unwrap();
    }

    let titles: Vec<String> = store
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["Early", "Late", "Anytime", "Tomorrow"]);
}

#[tokio::test]
async fn test_clear_all_reseeds_categories() {
    let (_dir, store) = open_store().await;
    store
        .insert_item(new_item("Dentist", "Mom", date(2024, 1, 3)))
        .await
        .unwrap();
    store.get_or_create_member("Mom").await.unwrap();
    store.add_category("Chores").await.unwrap();

    store.clear_all().await.unwrap();

    assert!(store.list_items().await.unwrap().is_empty());
    assert!(store.list_members().await.unwrap().is_empty());
    assert_eq!(store.list_categories().await.unwrap().len(), DEFAULT_CATEGORIES.len());
}

#[tokio::test]
async fn test_clear_all_rolls_back_when_reseed_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("big_board.db")).await.unwrap();
    let store = SqliteStore::new(pool.clone());
    store
        .insert_item(new_item("Dentist", "Mom", date(2024, 1, 3)))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_categories BEFORE INSERT ON categories \
         BEGIN SELECT RAISE(ABORT, 'categories are read-only'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    assert!(store.clear_all().await.is_err());
    assert_eq!(store.list_items().await.unwrap().len(), 1);
    assert_eq!(store.list_categories().await.unwrap().len(), DEFAULT_CATEGORIES.len());
}

#[tokio::test]
async fn test_unreadable_rows_do_not_hide_the_board() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("big_board.db")).await.unwrap();
    let store = SqliteStore::new(pool.clone());
    let good = store
        .insert_item(new_item("Dentist", "Mom", date(2024, 1, 3)))
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO items (title, family_member, date, time, category, recurrence, recurrence_day) \
         VALUES ('Bus', 'Kid', '2024-01-02', 'after lunch', 'Task', 'fortnightly', 3)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO items (title, family_member, date, category) \
         VALUES ('Someday', 'Kid', 'whenever', 'Task')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let items = store.list_items().await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Bus", "Dentist"]);

    let bus = &items[0];
    assert_eq!(bus.time_of_day, None);
    assert_eq!(bus.recurrence, None);
    assert_eq!(bus.recurrence_day, None);

    let board = resolve(&items, date(2024, 1, 3));
    assert!(board.iter().any(|i| i.id == good.id));
}
