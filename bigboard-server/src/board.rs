//! Board service: the single entry point for reading and changing the board
//!
//! Every mutation first commits to the store, then recomputes the board and
//! pushes it to all viewers. Operations on unknown ids or names fail with
//! `NotFound` and push nothing. REST handlers, the tool façade and viewer
//! commands all go through here.

use std::sync::Arc;

use bigboard_common::clock::{Clock, DisplayClock};
use bigboard_common::db::BoardStore;
use bigboard_common::events::{BoardEvent, BoardSnapshot, ClientCommand};
use bigboard_common::model::{
    non_blank, parse_color, Category, FamilyMember, Item, ItemDraft, ItemPatch,
};
use bigboard_common::visibility::resolve;
use bigboard_common::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::hub::{BroadcastHub, ConnectionId, Subscription};

/// Longest range `agenda` will expand, in days (inclusive)
pub const MAX_AGENDA_DAYS: i64 = 62;

/// Resolved items for one date of an agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub items: Vec<Item>,
}

pub struct BoardService {
    store: Arc<dyn BoardStore>,
    hub: Arc<BroadcastHub>,
    clock: Arc<dyn Clock>,
    display: DisplayClock,
}

impl BoardService {
    pub fn new(
        store: Arc<dyn BoardStore>,
        hub: Arc<BroadcastHub>,
        clock: Arc<dyn Clock>,
        display: DisplayClock,
    ) -> Self {
        Self {
            store,
            hub,
            clock,
            display,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Current display date and whether it is ahead of the calendar date
    pub fn display_date(&self) -> (NaiveDate, bool) {
        let now = self.clock.now();
        (self.display.display_date(now), self.display.is_tomorrow(now))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_item(&self, id: i64) -> Result<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| item_not_found(id))
    }

    /// Every stored item, unresolved
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.store.list_items().await
    }

    /// Items on the board for an explicit date, ignoring the display clock
    pub async fn board_for(&self, date: NaiveDate) -> Result<Vec<Item>> {
        let items = self.store.list_items().await?;
        Ok(resolve(&items, date))
    }

    /// Resolved items for each date in `from..=to`
    pub async fn agenda(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<AgendaDay>> {
        if from > to {
            return Err(Error::Validation(format!(
                "date_from {} is after date_to {}",
                from, to
            )));
        }
        let days = (to - from).num_days() + 1;
        if days > MAX_AGENDA_DAYS {
            return Err(Error::Validation(format!(
                "range of {} days exceeds the {} day limit",
                days, MAX_AGENDA_DAYS
            )));
        }

        let items = self.store.list_items().await?;
        Ok(from
            .iter_days()
            .take_while(|date| *date <= to)
            .map(|date| AgendaDay {
                date,
                items: resolve(&items, date),
            })
            .collect())
    }

    /// The board as a viewer would see it right now
    pub async fn current_board(&self) -> Result<BoardSnapshot> {
        let (display_date, is_tomorrow) = self.display_date();
        let (items, members, categories) = tokio::try_join!(
            self.store.list_items(),
            self.store.list_members(),
            self.store.list_categories(),
        )?;
        Ok(BoardSnapshot::new(
            display_date,
            is_tomorrow,
            &resolve(&items, display_date),
            &members,
            &categories,
        ))
    }

    pub async fn list_members(&self) -> Result<Vec<FamilyMember>> {
        self.store.list_members().await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and store a new item, creating its owner if unseen
    pub async fn create_item(&self, draft: ItemDraft) -> Result<Item> {
        let categories = self.store.list_categories().await?;
        let new_item = draft.validate(&categories)?;

        self.store.get_or_create_member(&new_item.owner).await?;
        let item = self.store.insert_item(new_item).await?;
        info!("Created item {} '{}' for {}", item.id, item.title, item.owner);

        self.publish().await;
        Ok(item)
    }

    /// Apply a partial update; nothing is written if any field is invalid
    pub async fn update_item(&self, id: i64, patch: ItemPatch) -> Result<Item> {
        let existing = self.get_item(id).await?;
        let categories = self.store.list_categories().await?;
        let updated = patch.apply_to(&existing, &categories)?;

        if updated.owner != existing.owner {
            self.store.get_or_create_member(&updated.owner).await?;
        }
        if !self.store.save_item(&updated).await? {
            return Err(item_not_found(id));
        }
        info!("Updated item {} '{}'", id, updated.title);

        self.publish().await;
        Ok(updated)
    }

    /// `false` (and no broadcast) when the id is unknown
    pub async fn delete_item(&self, id: i64) -> Result<bool> {
        let deleted = self.store.delete_item(id).await?;
        if deleted {
            info!("Deleted item {}", id);
            self.publish().await;
        } else {
            debug!("Delete of unknown item {}", id);
        }
        Ok(deleted)
    }

    /// Set or clear the handled flag; handling is stamped with the display date
    pub async fn mark_handled(&self, id: i64, handled: bool) -> Result<Item> {
        let mut item = self.get_item(id).await?;
        let (display_date, _) = self.display_date();
        item.set_handled(handled, display_date);

        if !self.store.save_item(&item).await? {
            return Err(item_not_found(id));
        }
        info!(
            "Item {} marked {}",
            id,
            if handled { "handled" } else { "not handled" }
        );

        self.publish().await;
        Ok(item)
    }

    pub async fn add_category(&self, name: &str) -> Result<Category> {
        let name = non_blank("category name", name)?;
        let category = self.store.add_category(&name).await?;
        info!("Category '{}' added", category.name);

        self.publish().await;
        Ok(category)
    }

    /// Items tagged with the category keep their tag
    pub async fn delete_category(&self, name: &str) -> Result<()> {
        if !self.store.delete_category(name).await? {
            return Err(Error::NotFound(format!("category '{}'", name)));
        }
        info!("Category '{}' deleted", name);

        self.publish().await;
        Ok(())
    }

    pub async fn update_member_color(&self, name: &str, color: &str) -> Result<FamilyMember> {
        let color = parse_color(color)?;
        let member = self
            .store
            .set_member_color(name, &color)
            .await?
            .ok_or_else(|| Error::NotFound(format!("family member '{}'", name)))?;
        info!("Family member '{}' color set to {}", member.name, member.color);

        self.publish().await;
        Ok(member)
    }

    /// Push the current board to every viewer without changing anything
    pub async fn refresh(&self) {
        self.publish().await;
    }

    // ========================================================================
    // Viewer connections
    // ========================================================================

    /// Open a viewer connection and queue its `init` snapshot
    ///
    /// The connection is registered before the snapshot is computed, so a
    /// mutation racing the handshake is never missed; if that mutation's
    /// update overtakes the init, the older init is dropped.
    pub async fn subscribe(&self) -> Result<Subscription> {
        let subscription = self.hub.subscribe();
        let revision = self.hub.next_revision();
        let snapshot = self.current_board().await?;
        self.hub
            .send_init(subscription.id(), BoardEvent::init(revision, Arc::new(snapshot)));
        Ok(subscription)
    }

    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.hub.disconnect(id)
    }

    /// Execute a command sent by a viewer
    pub async fn handle_command(&self, command: ClientCommand) -> Result<()> {
        debug!("Viewer command: {:?}", command);
        match command {
            ClientCommand::MarkHandled { item_id, handled } => {
                self.mark_handled(item_id, handled).await?;
            }
            ClientCommand::Refresh => self.refresh().await,
        }
        Ok(())
    }

    /// Recompute the board and broadcast it
    ///
    /// A failure here is logged, never returned: the mutation that triggered
    /// it has already committed.
    async fn publish(&self) {
        let revision = self.hub.next_revision();
        match self.current_board().await {
            Ok(snapshot) => {
                self.hub
                    .broadcast(BoardEvent::update(revision, Arc::new(snapshot)));
            }
            Err(e) => error!("Failed to compute board snapshot {}: {}", revision, e),
        }
    }
}

fn item_not_found(id: i64) -> Error {
    Error::NotFound(format!("item {}", id))
}

/// Log a failed viewer command; commands never fail the channel they came on
pub fn log_command_error(e: &Error) {
    match e {
        Error::NotFound(_) | Error::Validation(_) => warn!("Viewer command ignored: {}", e),
        _ => error!("Viewer command failed: {}", e),
    }
}
