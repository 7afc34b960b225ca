//! Recurrence matching
//!
//! Decides whether an item's rule produces an occurrence on a target date.
//! Pure and clock-independent.

use chrono::{Datelike, NaiveDate};

use crate::model::Recurrence;

/// Weekday index used by `recurrenceDay`: Monday = 0 ... Sunday = 6
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Does `rule` (anchored at `anchor`) fire on `target`?
///
/// Recurrence never projects backward: targets before the anchor never match.
/// A monthly day-of-month that does not exist in the target month (31 in
/// February) simply does not fire that month.
pub fn matches(
    anchor: NaiveDate,
    rule: Option<Recurrence>,
    rule_day: Option<u8>,
    target: NaiveDate,
) -> bool {
    let Some(rule) = rule else {
        return false;
    };
    if target < anchor {
        return false;
    }

    match rule {
        Recurrence::Daily => true,
        Recurrence::Weekdays => weekday_index(target) < 5,
        Recurrence::Weekly => {
            let wanted = rule_day.map_or_else(|| weekday_index(anchor), u32::from);
            weekday_index(target) == wanted
        }
        Recurrence::Monthly => {
            let wanted = rule_day.map_or_else(|| anchor.day(), u32::from);
            target.day() == wanted
        }
    }
}
