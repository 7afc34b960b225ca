//! Tool-call façade
//!
//! Named tools with JSON arguments and plain-text results, for assistants
//! that manage the board in natural language. Every call goes through
//! [`BoardService`], so tool-driven changes reach viewers like any other.

use bigboard_common::model::{parse_date, Item, ItemDraft, ItemPatch};
use bigboard_common::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::board::BoardService;

/// A callable tool as advertised to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Outcome of one tool call. Failures are results too, never transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "add_item",
            description: "Add a new item to the family board.\n\n\
                Use this for meetings, reminders, school events, tasks or activities. \
                Items appear on the board for the given date.\n\n\
                Recurrence options: null (one-time), \"daily\", \"weekdays\" (Monday to \
                Friday), \"weekly\" (same weekday, or recurrence_day 0-6 with Monday = 0), \
                \"monthly\" (same day of month, or recurrence_day 1-31).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Brief description (e.g. 'Math homework due')"},
                    "family_member": {"type": "string", "description": "Who this is for (e.g. 'Dad', 'Emma', 'Everyone')"},
                    "date": {"type": "string", "description": "Date in YYYY-MM-DD format"},
                    "time": {"type": "string", "description": "Optional time in HH:MM format (24-hour)"},
                    "category": {"type": "string", "description": "One of the board's categories"},
                    "recurrence": {"type": "string", "enum": ["daily", "weekdays", "weekly", "monthly"]},
                    "recurrence_day": {"type": "integer", "description": "Weekday 0-6 (weekly) or day of month 1-31 (monthly)"},
                    "stay_until_done": {"type": "boolean", "description": "Keep showing the item until it is marked handled"}
                },
                "required": ["title", "family_member", "date", "category"]
            }),
        },
        ToolDescriptor {
            name: "list_items",
            description: "List the items on the board for a date, or every stored item.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "date": {"type": "string", "description": "Optional date in YYYY-MM-DD format; omit to list all items"}
                }
            }),
        },
        ToolDescriptor {
            name: "remove_item",
            description: "Remove an item from the board by its ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_id": {"type": "integer", "description": "The ID of the item to remove"}
                },
                "required": ["item_id"]
            }),
        },
        ToolDescriptor {
            name: "update_item",
            description: "Update fields of an existing item. Omitted fields are left unchanged.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_id": {"type": "integer", "description": "The ID of the item to update"},
                    "title": {"type": "string"},
                    "family_member": {"type": "string"},
                    "date": {"type": "string"},
                    "time": {"type": "string"},
                    "category": {"type": "string"},
                    "recurrence": {"type": "string"},
                    "recurrence_day": {"type": "integer"},
                    "stay_until_done": {"type": "boolean"}
                },
                "required": ["item_id"]
            }),
        },
        ToolDescriptor {
            name: "mark_handled",
            description: "Mark an item as handled (done) for today, or clear that mark.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_id": {"type": "integer", "description": "The ID of the item"},
                    "handled": {"type": "boolean", "description": "Defaults to true"}
                },
                "required": ["item_id"]
            }),
        },
        ToolDescriptor {
            name: "list_family_members",
            description: "List all family members and their assigned colors.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDescriptor {
            name: "list_categories",
            description: "List all available categories.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDescriptor {
            name: "add_category",
            description: "Add a new category to the board.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the new category"}
                },
                "required": ["name"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct ListItemsArgs {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemIdArgs {
    item_id: i64,
}

#[derive(Debug, Deserialize)]
struct MarkHandledArgs {
    item_id: i64,
    #[serde(default = "default_handled")]
    handled: bool,
}

fn default_handled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AddCategoryArgs {
    name: String,
}

/// Run the tool `name` against the board
pub async fn call(board: &BoardService, name: &str, arguments: Value) -> ToolOutput {
    debug!("Tool call {} {}", name, arguments);
    let arguments = drop_nulls(arguments);

    let result = match name {
        "add_item" => add_item(board, arguments).await,
        "list_items" => list_items(board, arguments).await,
        "remove_item" => remove_item(board, arguments).await,
        "update_item" => update_item(board, arguments).await,
        "mark_handled" => mark_handled(board, arguments).await,
        "list_family_members" => list_family_members(board).await,
        "list_categories" => list_categories(board).await,
        "add_category" => add_category(board, arguments).await,
        _ => {
            warn!("Unknown tool requested: {}", name);
            return ToolOutput::error(format!("Unknown tool: {}", name));
        }
    };

    result.unwrap_or_else(|e| {
        warn!("Tool {} failed: {}", name, e);
        ToolOutput::error(format!("Error: {}", e))
    })
}

async fn add_item(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let draft: ItemDraft = parse_args(arguments)?;
    let item = board.create_item(draft).await?;
    Ok(ToolOutput::ok(format!(
        "Added item #{}: '{}' for {} on {}",
        item.id, item.title, item.owner, item.occurs_on
    )))
}

async fn list_items(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let args: ListItemsArgs = parse_args(arguments)?;
    let (header, items) = match args.date {
        Some(raw) => {
            let date = parse_date(&raw)?;
            (format!("Items for {}:", date), board.board_for(date).await?)
        }
        None => ("All items:".to_string(), board.list_items().await?),
    };

    if items.is_empty() {
        return Ok(ToolOutput::ok(format!("{}\n(none)", header)));
    }

    let mut lines = vec![header];
    lines.extend(items.iter().map(item_line));
    Ok(ToolOutput::ok(lines.join("\n")))
}

async fn remove_item(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let args: ItemIdArgs = parse_args(arguments)?;
    if board.delete_item(args.item_id).await? {
        Ok(ToolOutput::ok(format!("Removed item #{}", args.item_id)))
    } else {
        Ok(not_found(args.item_id))
    }
}

async fn update_item(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let Value::Object(mut fields) = arguments else {
        return Err(Error::Validation("arguments must be an object".to_string()));
    };
    let id_value = fields
        .remove("item_id")
        .ok_or_else(|| Error::Validation("missing field `item_id`".to_string()))?;
    let item_id: i64 = parse_args(id_value)?;
    let patch: ItemPatch = parse_args(Value::Object(fields))?;

    match board.update_item(item_id, patch).await {
        Ok(item) => Ok(ToolOutput::ok(format!("Updated item #{}: {}", item.id, item.title))),
        Err(Error::NotFound(_)) => Ok(not_found(item_id)),
        Err(e) => Err(e),
    }
}

async fn mark_handled(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let args: MarkHandledArgs = parse_args(arguments)?;
    match board.mark_handled(args.item_id, args.handled).await {
        Ok(item) => Ok(ToolOutput::ok(format!(
            "Marked item #{} as {}: {}",
            item.id,
            if item.handled { "handled" } else { "not handled" },
            item.title
        ))),
        Err(Error::NotFound(_)) => Ok(not_found(args.item_id)),
        Err(e) => Err(e),
    }
}

async fn list_family_members(board: &BoardService) -> Result<ToolOutput, Error> {
    let members = board.list_members().await?;
    if members.is_empty() {
        return Ok(ToolOutput::ok(
            "No family members yet (they are created when items are added)",
        ));
    }
    let mut lines = vec!["Family members:".to_string()];
    lines.extend(members.iter().map(|m| format!("  {}: {}", m.name, m.color)));
    Ok(ToolOutput::ok(lines.join("\n")))
}

async fn list_categories(board: &BoardService) -> Result<ToolOutput, Error> {
    let names: Vec<String> = board
        .list_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    Ok(ToolOutput::ok(format!("Categories: {}", names.join(", "))))
}

async fn add_category(board: &BoardService, arguments: Value) -> Result<ToolOutput, Error> {
    let args: AddCategoryArgs = parse_args(arguments)?;
    let category = board.add_category(&args.name).await?;
    Ok(ToolOutput::ok(format!("Added category: {}", category.name)))
}

fn item_line(item: &Item) -> String {
    let mut line = format!(
        "  #{}: [{}] {} - {}",
        item.id, item.category, item.owner, item.title
    );
    if let Some(time) = item.time_of_day {
        line.push_str(&format!(" at {}", time.format("%H:%M")));
    }
    if let Some(rule) = item.recurrence {
        line.push_str(&format!(" ({})", rule));
    }
    if item.handled {
        line.push_str(" [HANDLED]");
    }
    line
}

fn not_found(item_id: i64) -> ToolOutput {
    ToolOutput::error(format!("Item #{} not found", item_id))
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, Error> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::Validation(format!("invalid arguments: {}", e)))
}

/// Tool callers send `null` for "not given"
fn drop_nulls(arguments: Value) -> Value {
    match arguments {
        Value::Object(fields) => {
            Value::Object(fields.into_iter().filter(|(_, v)| !v.is_null()).collect())
        }
        Value::Null => Value::Object(Default::default()),
        other => other,
    }
}
