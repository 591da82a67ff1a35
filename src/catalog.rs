use std::io;
use std::path::Path;

use dashmap::DashMap;
use serde::Deserialize;

use crate::model::*;

/// Read access to the room/booking catalog.
pub trait Catalog: Send + Sync {
    fn find_room_group_by_business_id(&self, business_id: &str) -> Option<RoomGroup>;

    fn find_room_by_id(&self, room_id: &str) -> Option<Room>;

    /// Venues in `partition` with at least one room free for the whole window,
    /// listing only the free rooms.
    fn find_available_rooms_in_partition(
        &self,
        window: &RequestWindow,
        partition: &str,
    ) -> Vec<AvailableRoomDescriptor>;
}

/// Seed file layout for [`InMemoryCatalog::from_json`].
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub groups: Vec<RoomGroup>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

pub struct InMemoryCatalog {
    groups: DashMap<String, RoomGroup>,
    rooms: DashMap<String, Room>,
    /// Group business id → room ids, in insertion order.
    group_rooms: DashMap<String, Vec<String>>,
    /// Room id → booked spans, sorted by `start`.
    bookings: DashMap<String, Vec<Span>>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            rooms: DashMap::new(),
            group_rooms: DashMap::new(),
            bookings: DashMap::new(),
        }
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let catalog = Self::new();
        for group in seed.groups {
            catalog.insert_group(group);
        }
        for room in seed.rooms {
            catalog.insert_room(room);
        }
        for booking in seed.bookings {
            catalog.insert_booking(booking);
        }
        catalog
    }

    pub fn from_json(reader: impl io::Read) -> io::Result<Self> {
        let seed: CatalogSeed = serde_json::from_reader(reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self::from_seed(seed))
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_json(io::BufReader::new(file))
    }

    // ── Writes ───────────────────────────────────────────────

    pub fn insert_group(&self, group: RoomGroup) {
        self.groups.insert(group.business_id.clone(), group);
    }

    pub fn insert_room(&self, room: Room) {
        let mut ids = self.group_rooms.entry(room.group_business_id.clone()).or_default();
        if !ids.contains(&room.room_id) {
            ids.push(room.room_id.clone());
        }
        drop(ids);
        self.rooms.insert(room.room_id.clone(), room);
    }

    /// Insert a booking keeping each room's spans sorted by start.
    pub fn insert_booking(&self, booking: Booking) {
        let mut spans = self.bookings.entry(booking.room_id).or_default();
        let pos = spans
            .binary_search_by_key(&booking.span.start, |s| s.start)
            .unwrap_or_else(|e| e);
        spans.insert(pos, booking.span);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // ── Reads ────────────────────────────────────────────────

    /// True when no booking of `room_id` overlaps `query`.
    pub fn is_room_free(&self, room_id: &str, query: &Span) -> bool {
        let Some(spans) = self.bookings.get(room_id) else {
            return true;
        };
        // Everything at index >= right_bound starts at or after query.end.
        let right_bound = spans.partition_point(|s| s.start < query.end);
        !spans[..right_bound].iter().any(|s| s.end > query.start)
    }
}

impl Catalog for InMemoryCatalog {
    fn find_room_group_by_business_id(&self, business_id: &str) -> Option<RoomGroup> {
        self.groups.get(business_id).map(|e| e.value().clone())
    }

    fn find_room_by_id(&self, room_id: &str) -> Option<Room> {
        self.rooms.get(room_id).map(|e| e.value().clone())
    }

    fn find_available_rooms_in_partition(
        &self,
        window: &RequestWindow,
        partition: &str,
    ) -> Vec<AvailableRoomDescriptor> {
        let mut groups: Vec<RoomGroup> = self
            .groups
            .iter()
            .filter(|e| e.value().common_address.contains(partition))
            .map(|e| e.value().clone())
            .collect();
        groups.sort_by_key(|g| g.id);

        let query = window.span();
        let mut found = Vec::new();
        for group in groups {
            let room_ids = self
                .group_rooms
                .get(&group.business_id)
                .map(|e| e.value().clone())
                .unwrap_or_default();

            let mut descriptor = AvailableRoomDescriptor::for_group(&group);
            for room_id in room_ids {
                let Some(room) = self.find_room_by_id(&room_id) else {
                    continue;
                };
                let free = query.as_ref().is_none_or(|q| self.is_room_free(&room_id, q));
                if free {
                    descriptor.room_info_list.push(RoomSummary::from_room(&room));
                }
            }
            if !descriptor.room_info_list.is_empty() {
                found.push(descriptor);
            }
        }
        found
    }
}
