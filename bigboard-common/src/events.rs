//! Board snapshot events and viewer commands
//!
//! Viewers never receive diffs. Every event carries the complete board, so
//! delivering the same or an older state twice cannot corrupt a viewer.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{Category, FamilyMember, Item, Recurrence};

/// One item as shown on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    pub id: i64,
    pub title: String,
    pub owner: String,
    pub date: NaiveDate,
    #[serde(default, with = "crate::model::hhmm")]
    pub time: Option<NaiveTime>,
    pub category: String,
    pub recurrence: Option<Recurrence>,
    pub recurrence_day: Option<u8>,
    pub stay_until_done: bool,
    pub handled: bool,
}

impl From<&Item> for BoardItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            owner: item.owner.clone(),
            date: item.occurs_on,
            time: item.time_of_day,
            category: item.category.clone(),
            recurrence: item.recurrence,
            recurrence_day: item.recurrence_day,
            stay_until_done: item.stay_until_done,
            handled: item.handled,
        }
    }
}

/// Complete board state: resolved items plus the member and category registries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub display_date: NaiveDate,
    pub is_tomorrow: bool,
    pub items: Vec<BoardItem>,
    /// Member name -> color
    pub members: BTreeMap<String, String>,
    pub categories: Vec<String>,
}

impl BoardSnapshot {
    /// `items` must already be resolved and ordered for `display_date`
    pub fn new(
        display_date: NaiveDate,
        is_tomorrow: bool,
        items: &[Item],
        members: &[FamilyMember],
        categories: &[Category],
    ) -> Self {
        Self {
            display_date,
            is_tomorrow,
            items: items.iter().map(BoardItem::from).collect(),
            members: members
                .iter()
                .map(|m| (m.name.clone(), m.color.clone()))
                .collect(),
            categories: categories.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// First snapshot on a freshly opened connection
    Init,
    /// Snapshot pushed after a state change
    Update,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::Update => "update",
        }
    }
}

/// Snapshot plus delivery metadata
///
/// `revision` is assigned before the snapshot's state is read, so a higher
/// revision always reflects at least as much committed state as a lower one.
/// It travels out-of-band (as the SSE event id); the serialized payload is
/// `{"type": ..., <snapshot fields>}`.
#[derive(Debug, Clone)]
pub struct BoardEvent {
    pub kind: EventKind,
    pub revision: u64,
    pub snapshot: Arc<BoardSnapshot>,
}

impl BoardEvent {
    pub fn init(revision: u64, snapshot: Arc<BoardSnapshot>) -> Self {
        Self {
            kind: EventKind::Init,
            revision,
            snapshot,
        }
    }

    pub fn update(revision: u64, snapshot: Arc<BoardSnapshot>) -> Self {
        Self {
            kind: EventKind::Update,
            revision,
            snapshot,
        }
    }
}

impl Serialize for BoardEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "type")]
            kind: EventKind,
            #[serde(flatten)]
            snapshot: &'a BoardSnapshot,
        }

        Wire {
            kind: self.kind,
            snapshot: &self.snapshot,
        }
        .serialize(serializer)
    }
}

/// Commands a viewer may send back over the real-time channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    MarkHandled {
        item_id: i64,
        #[serde(default = "default_handled")]
        handled: bool,
    },
    Refresh,
}

fn default_handled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> BoardSnapshot {
        let item = Item {
            id: 3,
            title: "Pickup".to_string(),
            owner: "Dad".to_string(),
            occurs_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time_of_day: NaiveTime::from_hms_opt(15, 0, 0),
            category: "School".to_string(),
            recurrence: Some(Recurrence::Weekly),
            recurrence_day: Some(0),
            stay_until_done: false,
            handled: true,
            handled_on: NaiveDate::from_ymd_opt(2024, 1, 8),
        };
        BoardSnapshot::new(
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            false,
            &[item],
            &[FamilyMember {
                name: "Dad".to_string(),
                color: "#FF6B6B".to_string(),
            }],
            &[Category {
                name: "School".to_string(),
            }],
        )
    }

    #[test]
    fn test_event_payload_shape() {
        let event = BoardEvent::update(4, Arc::new(snapshot()));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["displayDate"], "2024-01-08");
        assert_eq!(value["isTomorrow"], false);
        assert_eq!(value["members"], json!({"Dad": "#FF6B6B"}));
        assert_eq!(value["categories"], json!(["School"]));
        assert!(value.get("revision").is_none());

        let item = &value["items"][0];
        let mut keys: Vec<&str> = item.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "category",
                "date",
                "handled",
                "id",
                "owner",
                "recurrence",
                "recurrenceDay",
                "stayUntilDone",
                "time",
                "title"
            ]
        );
        assert_eq!(item["time"], "15:00");
        assert_eq!(item["recurrence"], "weekly");
    }

    #[test]
    fn test_init_event_type() {
        let event = BoardEvent::init(1, Arc::new(snapshot()));
        assert_eq!(event.kind.as_str(), "init");
        assert_eq!(serde_json::to_value(&event).unwrap()["type"], "init");
    }

    #[test]
    fn test_client_commands_parse() {
        let cmd: ClientCommand =
            serde_json::from_value(json!({"type": "mark_handled", "item_id": 12})).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::MarkHandled {
                item_id: 12,
                handled: true
            }
        );

        let cmd: ClientCommand = serde_json::from_value(
            json!({"type": "mark_handled", "item_id": 12, "handled": false}),
        )
        .unwrap();
        assert_eq!(
            cmd,
            ClientCommand::MarkHandled {
                item_id: 12,
                handled: false
            }
        );

        let cmd: ClientCommand = serde_json::from_value(json!({"type": "refresh"})).unwrap();
        assert_eq!(cmd, ClientCommand::Refresh);

        assert!(serde_json::from_value::<ClientCommand>(json!({"type": "explode"})).is_err());
        assert!(serde_json::from_value::<ClientCommand>(json!({"type": "mark_handled"})).is_err());
    }
}
