//! Domain model: items, family members, categories
//!
//! Stored entities are plain data. Raw caller input arrives as [`ItemDraft`]
//! (creation) or [`ItemPatch`] (partial update) and is validated into typed
//! values before anything touches the store.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Wire format for dates (`2024-01-08`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for times of day, 24-hour (`07:45`)
pub const TIME_FORMAT: &str = "%H:%M";

/// Colors handed out to new family members, cycling by member count
pub const MEMBER_PALETTE: [&str; 8] = [
    "#FF6B6B", // coral red
    "#4ECDC4", // teal
    "#FFE66D", // yellow
    "#95E1D3", // mint
    "#F38181", // salmon
    "#AA96DA", // lavender
    "#6C5CE7", // purple
    "#00B894", // green
];

/// Categories seeded into an empty database
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Meeting", "School", "Reminder", "Task", "Activity"];

/// Color for the member created when `member_count` members already exist
pub fn palette_color(member_count: usize) -> &'static str {
    MEMBER_PALETTE[member_count % MEMBER_PALETTE.len()]
}

// ============================================================================
// Recurrence
// ============================================================================

/// Recurrence rule of an item. "No recurrence" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekdays,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekdays => "weekdays",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }

    /// Whether `recurrenceDay` means anything for this rule
    pub fn takes_day(&self) -> bool {
        matches!(self, Recurrence::Weekly | Recurrence::Monthly)
    }

    /// Parse an optional rule; `None`, blank and `"none"` mean no recurrence
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Recurrence>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("none") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }

    /// Check `day` against `rule`: weekday index 0-6 (Monday = 0) for weekly,
    /// day-of-month 1-31 for monthly, absent for everything else.
    pub fn validate_day(rule: Option<Recurrence>, day: Option<i64>) -> Result<Option<u8>> {
        let Some(day) = day else {
            return Ok(None);
        };
        let range = match rule {
            Some(Recurrence::Weekly) => 0..=6,
            Some(Recurrence::Monthly) => 1..=31,
            other => {
                let name = other.map_or("none", |r| r.as_str());
                return Err(Error::Validation(format!(
                    "recurrenceDay is not allowed for recurrence '{}'",
                    name
                )));
            }
        };
        if range.contains(&day) {
            Ok(Some(day as u8))
        } else {
            Err(Error::Validation(format!(
                "recurrenceDay {} out of range {}-{}",
                day,
                range.start(),
                range.end()
            )))
        }
    }
}

impl FromStr for Recurrence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekdays" => Ok(Recurrence::Weekdays),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            other => Err(Error::Validation(format!(
                "unknown recurrence '{}' (expected daily, weekdays, weekly or monthly)",
                other
            ))),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A schedulable unit of attention
///
/// Invariants: `handled_on.is_some() == handled`; `recurrence_day` is `None`
/// whenever `recurrence` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub owner: String,
    /// Anchor date
    #[serde(rename = "date")]
    pub occurs_on: NaiveDate,
    #[serde(rename = "time", default, with = "hhmm")]
    pub time_of_day: Option<NaiveTime>,
    pub category: String,
    pub recurrence: Option<Recurrence>,
    pub recurrence_day: Option<u8>,
    pub stay_until_done: bool,
    pub handled: bool,
    pub handled_on: Option<NaiveDate>,
}

impl Item {
    /// Set or clear the handled state, keeping `handled_on` in step
    pub fn set_handled(&mut self, handled: bool, on: NaiveDate) {
        self.handled = handled;
        self.handled_on = handled.then_some(on);
    }
}

/// A validated item that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub owner: String,
    pub occurs_on: NaiveDate,
    pub time_of_day: Option<NaiveTime>,
    pub category: String,
    pub recurrence: Option<Recurrence>,
    pub recurrence_day: Option<u8>,
    pub stay_until_done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

// ============================================================================
// Caller input
// ============================================================================

/// Raw creation request, as received from a REST or tool caller
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemDraft {
    pub title: String,
    #[serde(alias = "family_member")]
    pub owner: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    pub category: String,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default, alias = "recurrence_day")]
    pub recurrence_day: Option<i64>,
    #[serde(default, alias = "stay_until_done")]
    pub stay_until_done: bool,
}

impl ItemDraft {
    /// Validate every field; `categories` is the current category registry
    pub fn validate(self, categories: &[Category]) -> Result<NewItem> {
        let title = non_blank("title", &self.title)?;
        let owner = non_blank("owner", &self.owner)?;
        let occurs_on = parse_date(&self.date)?;
        let time_of_day = parse_optional_time(self.time.as_deref())?;
        let category = known_category(&self.category, categories)?;
        let recurrence = Recurrence::parse_optional(self.recurrence.as_deref())?;
        let recurrence_day = Recurrence::validate_day(recurrence, self.recurrence_day)?;

        Ok(NewItem {
            title,
            owner,
            occurs_on,
            time_of_day,
            category,
            recurrence,
            recurrence_day,
            stay_until_done: self.stay_until_done,
        })
    }
}

/// Partial update. Only the fields listed here can be changed; unknown keys
/// are rejected at deserialization. `handled` is deliberately absent: it is
/// written only by mark-handled.
///
/// Nullable fields use `Option<Option<_>>`: absent = leave alone,
/// `null` = clear.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "family_member")]
    pub owner: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub time: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub recurrence: Option<Option<String>>,
    #[serde(default, alias = "recurrence_day", deserialize_with = "double_option")]
    pub recurrence_day: Option<Option<i64>>,
    #[serde(default, alias = "stay_until_done")]
    pub stay_until_done: Option<bool>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.owner.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.category.is_none()
            && self.recurrence.is_none()
            && self.recurrence_day.is_none()
            && self.stay_until_done.is_none()
    }

    /// Produce the updated item. Every field is validated before the result
    /// is returned, so an invalid patch leaves nothing half-applied.
    pub fn apply_to(&self, item: &Item, categories: &[Category]) -> Result<Item> {
        if self.is_empty() {
            return Err(Error::Validation("no fields to update".to_string()));
        }

        let mut next = item.clone();
        if let Some(title) = &self.title {
            next.title = non_blank("title", title)?;
        }
        if let Some(owner) = &self.owner {
            next.owner = non_blank("owner", owner)?;
        }
        if let Some(date) = &self.date {
            next.occurs_on = parse_date(date)?;
        }
        if let Some(time) = &self.time {
            next.time_of_day = parse_optional_time(time.as_deref())?;
        }
        if let Some(category) = &self.category {
            if category.trim() != item.category {
                next.category = known_category(category, categories)?;
            }
        }

        let rule = match &self.recurrence {
            Some(raw) => Recurrence::parse_optional(raw.as_deref())?,
            None => item.recurrence,
        };
        let day = match self.recurrence_day {
            Some(day) => day,
            // a stored day only means something under the rule it was set for
            None if rule == item.recurrence && rule.is_some_and(|r| r.takes_day()) => {
                item.recurrence_day.map(i64::from)
            }
            None => None,
        };
        next.recurrence = rule;
        next.recurrence_day = Recurrence::validate_day(rule, day)?;

        if let Some(stay) = self.stay_until_done {
            next.stay_until_done = stay;
        }
        Ok(next)
    }
}

// ============================================================================
// Field parsing
// ============================================================================

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::Validation(format!("invalid date '{}' (expected YYYY-MM-DD)", raw)))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| Error::Validation(format!("invalid time '{}' (expected HH:MM)", raw)))
}

/// Blank means "no time"
pub fn parse_optional_time(raw: Option<&str>) -> Result<Option<NaiveTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_time(s).map(Some),
    }
}

/// `#RRGGBB`
pub fn parse_color(raw: &str) -> Result<String> {
    let color = raw.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color.to_string())
    } else {
        Err(Error::Validation(format!("invalid color '{}' (expected #RRGGBB)", raw)))
    }
}

pub fn non_blank(field: &str, raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        Err(Error::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(value.to_string())
    }
}

fn known_category(raw: &str, categories: &[Category]) -> Result<String> {
    let name = non_blank("category", raw)?;
    if categories.iter().any(|c| c.name == name) {
        Ok(name)
    } else {
        Err(Error::Validation(format!("unknown category '{}'", name)))
    }
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) mod hhmm {
    use super::{parse_time, TIME_FORMAT};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&t.format(TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_time(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn categories() -> Vec<Category> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|name| Category { name: name.to_string() })
            .collect()
    }

    fn stored_item() -> Item {
        Item {
            id: 7,
            title: "Piano".to_string(),
            owner: "Emma".to_string(),
            occurs_on: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time_of_day: NaiveTime::from_hms_opt(16, 30, 0),
            category: "Activity".to_string(),
            recurrence: Some(Recurrence::Weekly),
            recurrence_day: Some(1),
            stay_until_done: false,
            handled: false,
            handled_on: None,
        }
    }

    #[test]
    fn test_palette_cycles_by_member_count() {
        assert_eq!(palette_color(0), "#FF6B6B");
        assert_eq!(palette_color(7), "#00B894");
        assert_eq!(palette_color(8), "#FF6B6B");
    }

    #[test]
    fn test_recurrence_parsing() {
        assert_eq!(Recurrence::parse_optional(None).unwrap(), None);
        assert_eq!(Recurrence::parse_optional(Some("none")).unwrap(), None);
        assert_eq!(Recurrence::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            Recurrence::parse_optional(Some("Weekly")).unwrap(),
            Some(Recurrence::Weekly)
        );
        assert!(matches!(
            Recurrence::parse_optional(Some("yearly")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_recurrence_day_ranges() {
        assert_eq!(Recurrence::validate_day(Some(Recurrence::Weekly), Some(6)).unwrap(), Some(6));
        assert!(Recurrence::validate_day(Some(Recurrence::Weekly), Some(7)).is_err());
        assert!(Recurrence::validate_day(Some(Recurrence::Monthly), Some(0)).is_err());
        assert_eq!(Recurrence::validate_day(Some(Recurrence::Monthly), Some(31)).unwrap(), Some(31));
        assert!(Recurrence::validate_day(None, Some(3)).is_err());
        assert!(Recurrence::validate_day(Some(Recurrence::Daily), Some(3)).is_err());
        assert_eq!(Recurrence::validate_day(None, None).unwrap(), None);
    }

    #[test]
    fn test_draft_validates_into_new_item() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "title": " Pickup ",
            "family_member": "Dad",
            "date": "2024-01-01",
            "time": "15:05",
            "category": "School",
            "recurrence": "weekly",
            "recurrence_day": 0
        }))
        .unwrap();

        let item = draft.validate(&categories()).unwrap();
        assert_eq!(item.title, "Pickup");
        assert_eq!(item.owner, "Dad");
        assert_eq!(item.occurs_on, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(item.time_of_day, NaiveTime::from_hms_opt(15, 5, 0));
        assert_eq!(item.recurrence, Some(Recurrence::Weekly));
        assert_eq!(item.recurrence_day, Some(0));
        assert!(!item.stay_until_done);
    }

    #[test]
    fn test_draft_rejects_malformed_fields() {
        let base = json!({
            "title": "Dentist", "owner": "Mom", "date": "2024-02-30", "category": "Meeting"
        });
        let draft: ItemDraft = serde_json::from_value(base).unwrap();
        assert!(matches!(draft.validate(&categories()), Err(Error::Validation(_))));

        let draft: ItemDraft = serde_json::from_value(json!({
            "title": "Dentist", "owner": "Mom", "date": "2024-02-03",
            "time": "25:00", "category": "Meeting"
        }))
        .unwrap();
        assert!(draft.validate(&categories()).is_err());

        let draft: ItemDraft = serde_json::from_value(json!({
            "title": "Dentist", "owner": "Mom", "date": "2024-02-03", "category": "Chores"
        }))
        .unwrap();
        assert!(draft.validate(&categories()).is_err());
    }

    #[test]
    fn test_draft_rejects_unknown_keys() {
        let result = serde_json::from_value::<ItemDraft>(json!({
            "title": "x", "owner": "y", "date": "2024-01-01", "category": "Task", "priority": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_rejects_unknown_and_handled_keys() {
        assert!(serde_json::from_value::<ItemPatch>(json!({"handled": true})).is_err());
        assert!(serde_json::from_value::<ItemPatch>(json!({"colour": "red"})).is_err());
    }

    #[test]
    fn test_empty_patch_is_invalid() {
        let patch = ItemPatch::default();
        assert!(patch.is_empty());
        assert!(matches!(
            patch.apply_to(&stored_item(), &categories()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ItemPatch = serde_json::from_value(json!({"time": null})).unwrap();
        let updated = patch.apply_to(&stored_item(), &categories()).unwrap();
        assert_eq!(updated.time_of_day, None);
        assert_eq!(updated.title, "Piano");

        let patch: ItemPatch = serde_json::from_value(json!({"title": "Piano lesson"})).unwrap();
        let updated = patch.apply_to(&stored_item(), &categories()).unwrap();
        assert_eq!(updated.time_of_day, NaiveTime::from_hms_opt(16, 30, 0));
        assert_eq!(updated.title, "Piano lesson");
    }

    #[test]
    fn test_patch_clearing_recurrence_clears_day() {
        let patch: ItemPatch = serde_json::from_value(json!({"recurrence": null})).unwrap();
        let updated = patch.apply_to(&stored_item(), &categories()).unwrap();
        assert_eq!(updated.recurrence, None);
        assert_eq!(updated.recurrence_day, None);

        let patch: ItemPatch = serde_json::from_value(json!({"recurrence": "daily"})).unwrap();
        let updated = patch.apply_to(&stored_item(), &categories()).unwrap();
        assert_eq!(updated.recurrence, Some(Recurrence::Daily));
        assert_eq!(updated.recurrence_day, None);
    }

    #[test]
    fn test_patch_changing_rule_kind_drops_stale_day() {
        let mut item = stored_item();
        item.recurrence = Some(Recurrence::Monthly);
        item.recurrence_day = Some(3);

        let patch: ItemPatch = serde_json::from_value(json!({"recurrence": "weekly"})).unwrap();
        let updated = patch.apply_to(&item, &categories()).unwrap();
        assert_eq!(updated.recurrence, Some(Recurrence::Weekly));
        assert_eq!(updated.recurrence_day, None);

        let patch: ItemPatch =
            serde_json::from_value(json!({"recurrence": "weekly", "recurrenceDay": 4})).unwrap();
        assert_eq!(patch.apply_to(&item, &categories()).unwrap().recurrence_day, Some(4));

        let patch: ItemPatch = serde_json::from_value(json!({"recurrence": "monthly"})).unwrap();
        assert_eq!(patch.apply_to(&item, &categories()).unwrap().recurrence_day, Some(3));

        let patch: ItemPatch = serde_json::from_value(json!({"title": "Rent"})).unwrap();
        assert_eq!(patch.apply_to(&item, &categories()).unwrap().recurrence_day, Some(3));
    }

    #[test]
    fn test_invalid_patch_applies_nothing() {
        let item = stored_item();
        let patch: ItemPatch =
            serde_json::from_value(json!({"title": "New", "date": "not-a-date"})).unwrap();
        assert!(patch.apply_to(&item, &categories()).is_err());
        assert_eq!(item.title, "Piano");
    }

    #[test]
    fn test_patch_keeps_category_removed_from_registry() {
        let mut item = stored_item();
        item.category = "Retired".to_string();
        let patch: ItemPatch = serde_json::from_value(json!({"category": "Retired"})).unwrap();
        assert_eq!(patch.apply_to(&item, &categories()).unwrap().category, "Retired");
    }

    #[test]
    fn test_set_handled_keeps_invariant() {
        let mut item = stored_item();
        let day = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        item.set_handled(true, day);
        assert_eq!(item.handled_on, Some(day));
        item.set_handled(false, day);
        assert!(!item.handled);
        assert_eq!(item.handled_on, None);
    }

    #[test]
    fn test_item_wire_names() {
        let value = serde_json::to_value(stored_item()).unwrap();
        assert_eq!(value["date"], "2024-01-02");
        assert_eq!(value["time"], "16:30");
        assert_eq!(value["recurrence"], "weekly");
        assert_eq!(value["recurrenceDay"], 1);
        assert_eq!(value["stayUntilDone"], false);
        assert!(value["handledOn"].is_null());
    }

    #[test]
    fn test_color_validation() {
        assert_eq!(parse_color("#a1B2c3").unwrap(), "#a1B2c3");
        assert!(parse_color("red").is_err());
        assert!(parse_color("#12345").is_err());
    }
}
