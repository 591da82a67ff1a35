use std::collections::{HashMap, HashSet};

use chrono::TimeDelta;

use crate::model::*;

// ── Continuity grouping ───────────────────────────────────────────

/// Split slots into runs of hour-spaced consecutive timestamps.
///
/// Single pass in input order: a slot extends the most recently opened run when
/// it lands exactly one hour after that run's last slot, otherwise it opens a
/// new run. Input is NOT sorted first, so out-of-order slots fragment runs.
pub fn group_continuous_runs(slots: &[Slot]) -> Vec<Vec<Slot>> {
    let mut runs: Vec<Vec<Slot>> = Vec::new();
    for &slot in slots {
        push_slot(&mut runs, slot);
    }
    runs
}

/// Same as [`group_continuous_runs`], keeping one run list per room.
/// Rooms appear in first-seen order.
pub fn group_by_room<'a, I>(slots: I) -> Vec<(&'a str, Vec<Vec<Slot>>)>
where
    I: IntoIterator<Item = (&'a str, Slot)>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut grouped: Vec<(&'a str, Vec<Vec<Slot>>)> = Vec::new();
    for (room_id, slot) in slots {
        let pos = *index.entry(room_id).or_insert_with(|| {
            grouped.push((room_id, Vec::new()));
            grouped.len() - 1
        });
        push_slot(&mut grouped[pos].1, slot);
    }
    grouped
}

fn push_slot(runs: &mut Vec<Vec<Slot>>, slot: Slot) {
    if let Some(last_run) = runs.last_mut()
        && let Some(&last) = last_run.last()
        && last + TimeDelta::hours(1) == slot
    {
        last_run.push(slot);
        return;
    }
    runs.push(vec![slot]);
}

// ── Window matching ───────────────────────────────────────────────

/// True iff every hourly checkpoint of `window` is an available slot.
/// A window with no checkpoints (`end <= start`) always matches.
pub fn covers_window(available: &HashSet<Slot>, window: &RequestWindow) -> bool {
    window.checkpoints().all(|cp| available.contains(&cp))
}

/// First checkpoint of `window` missing from `available`, if any.
pub fn first_gap(available: &HashSet<Slot>, window: &RequestWindow) -> Option<Slot> {
    window.checkpoints().find(|cp| !available.contains(cp))
}
