mod availability;
mod error;
mod fallback;
mod normalize;

pub use availability::{covers_window, first_gap, group_by_room, group_continuous_runs};
pub use error::EngineError;
pub use fallback::{
    FALLBACK_PARTITIONS, FallbackMode, FallbackSearch, PartitionPicker, RandomPicker,
};
pub use normalize::{SLOT_FORMAT, normalize_slots, parse_slot};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::model::*;
use crate::source::SlotSource;

/// Reconciles live scraper data with the catalog to answer
/// "which rooms are free for this whole window in these districts".
///
/// Holds no per-request state; every call builds its results from scratch.
pub struct Engine {
    source: Arc<dyn SlotSource>,
    catalog: Arc<dyn Catalog>,
    fallback: FallbackSearch,
}

impl Engine {
    pub fn new(
        source: Arc<dyn SlotSource>,
        catalog: Arc<dyn Catalog>,
        fallback: FallbackSearch,
    ) -> Self {
        Self {
            source,
            catalog,
            fallback,
        }
    }

    /// Free rooms for `window` across the comma-separated `partitions`.
    ///
    /// 1. Crawl each partition in order; any crawl failure aborts the call.
    /// 2. Keep rooms whose live slots cover every hour of the window, grouped by venue.
    /// 3. If nothing qualifies, the answer is the catalog fallback search instead.
    pub async fn find_available_rooms(
        &self,
        window: &RequestWindow,
        partitions: &str,
    ) -> Result<Vec<AvailableRoomDescriptor>, EngineError> {
        let started = Instant::now();
        let result = self.search(window, partitions).await;

        let outcome = match &result {
            Ok((_, true)) => "fallback",
            Ok((_, false)) => "live",
            Err(_) => "error",
        };
        metrics::counter!(crate::observability::SEARCHES_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(crate::observability::SEARCH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let (rooms, _) = result?;
        metrics::histogram!(crate::observability::ROOMS_RETURNED).record(rooms.len() as f64);
        Ok(rooms)
    }

    /// Returns the rooms and whether they came from the fallback path.
    async fn search(
        &self,
        window: &RequestWindow,
        partitions: &str,
    ) -> Result<(Vec<AvailableRoomDescriptor>, bool), EngineError> {
        let partition_set = PartitionSet::parse(partitions);
        let date = window.query_date();
        info!(
            start = %window.start,
            end = %window.end,
            partitions = ?partition_set,
            "searching available rooms"
        );

        let mut results: Vec<RawSlotResult> = Vec::new();
        for partition in partition_set.iter() {
            let batch = self.source.fetch(partition, &date).await?;
            debug!(partition, entries = batch.len(), "partition crawled");
            results.extend(batch);
        }
        metrics::counter!(crate::observability::SLOT_RESULTS_TOTAL).increment(results.len() as u64);

        let rooms = self.reconcile(window, &results);
        info!(venues = rooms.len(), "live availability reconciled");
        if !rooms.is_empty() {
            return Ok((rooms, false));
        }

        info!("no live match, falling back to catalog search");
        Ok((self.fallback.search(self.catalog.as_ref(), window, partitions), true))
    }

    /// Match combined scraper results against `window`.
    ///
    /// Venues appear in first-match order, rooms within a venue in scan order.
    /// Entries for unknown venues or without slot data are skipped.
    pub fn reconcile(
        &self,
        window: &RequestWindow,
        results: &[RawSlotResult],
    ) -> Vec<AvailableRoomDescriptor> {
        let mut rooms: Vec<AvailableRoomDescriptor> = Vec::new();
        let mut by_group: HashMap<&str, usize> = HashMap::new();

        for result in results {
            let Some(group) = self
                .catalog
                .find_room_group_by_business_id(&result.room_group_id)
            else {
                debug!(pr_id = %result.room_group_id, "venue not in catalog, skipping");
                metrics::counter!(crate::observability::UNKNOWN_GROUPS_TOTAL).increment(1);
                continue;
            };
            let Some(times) = &result.available_times else {
                continue;
            };

            let slots = normalize_slots(times);
            let available: HashSet<Slot> = slots.iter().copied().collect();
            if let Some(gap) = first_gap(&available, window) {
                debug!(
                    pr_id = %result.room_group_id,
                    room_id = %result.room_id,
                    runs = group_continuous_runs(&slots).len(),
                    %gap,
                    "room does not cover window"
                );
                continue;
            }

            let pos = *by_group.entry(result.room_group_id.as_str()).or_insert_with(|| {
                rooms.push(AvailableRoomDescriptor::for_group(&group));
                rooms.len() - 1
            });
            rooms[pos].room_info_list.push(self.room_summary(&result.room_id));
        }
        rooms
    }

    fn room_summary(&self, room_id: &str) -> RoomSummary {
        match self.catalog.find_room_by_id(room_id) {
            Some(room) => RoomSummary::from_room(&room),
            None => RoomSummary::unknown(room_id),
        }
    }
}
