//! Visibility resolver
//!
//! Given every stored item and a target date, produces the ordered list of
//! items on that day's board:
//!
//! 1. date-bound items whose anchor is the target date
//! 2. recurring date-bound items whose rule fires on the target date
//!    (anchor == target is already covered by 1)
//! 3. stay-until-done items that are still pending, whatever the date
//!
//! Date-bound items handled on a different day are shown as pending. That
//! override lives only in the returned view; stored state is never touched.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::model::Item;
use crate::recurrence;

/// Items visible on `target`, sorted by time (untimed last), then title
pub fn resolve(items: &[Item], target: NaiveDate) -> Vec<Item> {
    let mut visible: Vec<Item> = items
        .iter()
        .filter_map(|item| select(item, target))
        .collect();
    visible.sort_by(board_order);
    visible
}

/// Each item lands in exactly one branch, so no item is selected twice.
fn select(item: &Item, target: NaiveDate) -> Option<Item> {
    if item.stay_until_done {
        return (!item.handled).then(|| item.clone());
    }

    let on_board = item.occurs_on == target
        || recurrence::matches(item.occurs_on, item.recurrence, item.recurrence_day, target);
    on_board.then(|| reset_stale_handled(item.clone(), target))
}

/// Handled state only counts for the day it was recorded on
fn reset_stale_handled(mut item: Item, target: NaiveDate) -> Item {
    if item.handled && item.handled_on != Some(target) {
        item.handled = false;
        item.handled_on = None;
    }
    item
}

fn board_order(a: &Item, b: &Item) -> Ordering {
    let by_time = match (a.time_of_day, b.time_of_day) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then_with(|| a.title.cmp(&b.title))
}
