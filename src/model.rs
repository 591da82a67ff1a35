use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::EngineError;

/// Local wall-clock timestamp at minute precision — the only time type.
pub type Slot = NaiveDateTime;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Slot,
    pub end: Slot,
}

impl Span {
    pub fn new(start: Slot, end: Slot) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ── Request window ───────────────────────────────────────────────

/// The caller's requested `[start, end)` interval, checked hour by hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    pub start: Slot,
    pub end: Slot,
}

impl RequestWindow {
    pub fn new(start: Slot, end: Slot) -> Self {
        Self { start, end }
    }

    /// Combine a `yyyy-MM-dd` date with two `HH:mm:ss` (or `HH:mm`) times.
    pub fn from_parts(date: &str, start_time: &str, end_time: &str) -> Result<Self, EngineError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| EngineError::InvalidWindow(format!("date {date:?}: {e}")))?;
        let start = parse_time(start_time)?;
        let end = parse_time(end_time)?;
        Ok(Self::new(date.and_time(start), date.and_time(end)))
    }

    /// Hourly checkpoints `start, start+1h, …` whose full hour fits inside the window.
    /// Empty when `end <= start`.
    pub fn checkpoints(&self) -> impl Iterator<Item = Slot> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), |t| t.checked_add_signed(TimeDelta::hours(1)))
            .take_while(move |t| *t + TimeDelta::hours(1) <= end)
    }

    /// Date component of `start`, formatted for the scraper.
    pub fn query_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn span(&self) -> Option<Span> {
        (self.start < self.end).then(|| Span::new(self.start, self.end))
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, EngineError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| EngineError::InvalidWindow(format!("time {raw:?}: {e}")))
}

// ── Partitions ───────────────────────────────────────────────────

/// Ordered district names from a comma-separated request parameter.
/// Order and duplicates are preserved; trailing empty pieces are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionSet(Vec<String>);

impl PartitionSet {
    pub fn parse(csv: &str) -> Self {
        let mut parts: Vec<String> = csv.split(',').map(|p| p.trim().to_string()).collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        Self(parts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, partition: &str) -> bool {
        self.0.iter().any(|p| p == partition)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Scraper output ───────────────────────────────────────────────

/// One room's entry in the scraper's results file.
///
/// Wire shape: `{"success": bool, "prId": str, "roomId": str, "data": [str]}`.
/// Unknown fields are ignored; ids may arrive as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlotResult {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "prId", default, deserialize_with = "string_or_number")]
    pub room_group_id: String,
    #[serde(rename = "roomId", default, deserialize_with = "string_or_number")]
    pub room_id: String,
    #[serde(rename = "data", default)]
    pub available_times: Option<Vec<String>>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
        Id::Null(()) => String::new(),
    })
}

// ── Catalog records ──────────────────────────────────────────────

/// A venue holding one or more bookable rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomGroup {
    /// Catalog primary key; also the listing order.
    pub id: u64,
    /// Identifier used by the external booking site (the scraper's `prId`).
    pub business_id: String,
    pub name: String,
    pub address: String,
    /// District-level address used for partition searches.
    pub common_address: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub group_business_id: String,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub room_id: String,
    pub span: Span,
}

// ── Query result types ───────────────────────────────────────────

pub const UNKNOWN_ROOM_NAME: &str = "Unknown";
pub const UNKNOWN_ROOM_PRICE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub room_name: String,
    pub price: i64,
}

impl RoomSummary {
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_id: room.room_id.clone(),
            room_name: room.name.clone(),
            price: room.price,
        }
    }

    /// Sentinel for a room id the catalog does not know.
    pub fn unknown(room_id: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            room_name: UNKNOWN_ROOM_NAME.to_string(),
            price: UNKNOWN_ROOM_PRICE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRoomDescriptor {
    pub room_group_id: u64,
    pub name: String,
    pub address: String,
    pub image_url: Option<String>,
    pub room_info_list: Vec<RoomSummary>,
}

impl AvailableRoomDescriptor {
    /// Descriptor carrying the group's catalog attributes and no rooms yet.
    pub fn for_group(group: &RoomGroup) -> Self {
        Self {
            room_group_id: group.id,
            name: group.name.clone(),
            address: group.address.clone(),
            image_url: group.image_url.clone(),
            room_info_list: Vec::new(),
        }
    }
}
