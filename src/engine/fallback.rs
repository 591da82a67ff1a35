use std::str::FromStr;

use rand::seq::SliceRandom;
use tracing::info;

use crate::catalog::Catalog;
use crate::model::*;

/// Substitute districts searched when live data yields no room.
/// `서초구` is listed twice, which doubles its odds of being picked.
pub const FALLBACK_PARTITIONS: [&str; 11] = [
    "연남동", "합정동", "강서구", "성동구", "서초구", "동작구", "송파구", "종로구", "광진구", "서초구",
    "은평구",
];

/// Ordering source for substitute selection.
pub trait PartitionPicker: Send + Sync {
    /// Reorder `candidates` in place. The first entry and the next one naming a
    /// different district become the substitutes.
    fn shuffle(&self, candidates: &mut [String]);
}

/// Uniform shuffle from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl PartitionPicker for RandomPicker {
    fn shuffle(&self, candidates: &mut [String]) {
        candidates.shuffle(&mut rand::thread_rng());
    }
}

/// How the two substitute searches are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Both searches target the first substitute, so its rooms appear twice.
    #[default]
    Duplicate,
    /// One search per distinct substitute.
    Distinct,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duplicate" => Ok(FallbackMode::Duplicate),
            "distinct" => Ok(FallbackMode::Distinct),
            other => Err(format!("unknown fallback mode: {other}")),
        }
    }
}

pub struct FallbackSearch {
    picker: Box<dyn PartitionPicker>,
    mode: FallbackMode,
}

impl FallbackSearch {
    pub fn new(picker: Box<dyn PartitionPicker>, mode: FallbackMode) -> Self {
        Self { picker, mode }
    }

    /// Pick up to two different substitutes, never one named in `original`.
    pub fn choose_substitutes(&self, original: &str) -> Vec<String> {
        let requested = PartitionSet::parse(original);
        let mut candidates: Vec<String> = FALLBACK_PARTITIONS
            .iter()
            .copied()
            .filter(|p| !requested.contains(p))
            .map(str::to_string)
            .collect();
        self.picker.shuffle(&mut candidates);

        let mut picked = candidates.into_iter();
        let Some(first) = picked.next() else {
            return Vec::new();
        };
        match picked.find(|p| *p != first) {
            Some(second) => vec![first, second],
            None => vec![first],
        }
    }

    /// Search the catalog in substitute districts and concatenate the results.
    /// An empty result is final; there is no further fallback.
    pub fn search(
        &self,
        catalog: &dyn Catalog,
        window: &RequestWindow,
        original: &str,
    ) -> Vec<AvailableRoomDescriptor> {
        let substitutes = self.choose_substitutes(original);
        let targets: Vec<&str> = match (self.mode, substitutes.as_slice()) {
            (FallbackMode::Duplicate, [first, _, ..]) => vec![first.as_str(), first.as_str()],
            (_, subs) => subs.iter().map(String::as_str).collect(),
        };
        info!(original, ?substitutes, ?targets, "fallback search");

        let mut rooms = Vec::new();
        for partition in targets {
            rooms.extend(catalog.find_available_rooms_in_partition(window, partition));
        }
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use chrono::NaiveDate;

    /// Leaves candidates in pool order.
    struct InOrder;

    impl PartitionPicker for InOrder {
        fn shuffle(&self, _candidates: &mut [String]) {}
    }

    struct Reversing;

    /// Moves both `서초구` entries to the front, keeping the rest in pool order.
    struct SeochoFirst;

    impl PartitionPicker for SeochoFirst {
        fn shuffle(&self, candidates: &mut [String]) {
            candidates.sort_by_key(|c| c != "서초구");
        }
    }

    impl PartitionPicker for Reversing {
        fn shuffle(&self, candidates: &mut [String]) {
            candidates.reverse();
        }
    }

    fn at(h: u32) -> Slot {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn group(id: u64, business_id: &str, district: &str) -> RoomGroup {
        RoomGroup {
            id,
            business_id: business_id.into(),
            name: format!("studio {id}"),
            address: format!("서울 {district} {id}"),
            common_address: format!("서울 {district}"),
            image_url: None,
        }
    }

    fn room(room_id: &str, business_id: &str) -> Room {
        Room {
            room_id: room_id.into(),
            group_business_id: business_id.into(),
            name: format!("room {room_id}"),
            price: 10_000,
        }
    }

    fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.insert_group(group(1, "p1", "연남동"));
        catalog.insert_room(room("r1", "p1"));
        catalog.insert_group(group(2, "p2", "합정동"));
        catalog.insert_room(room("r2", "p2"));
        catalog
    }

    #[test]
    fn original_never_chosen() {
        let fb = FallbackSearch::new(Box::new(RandomPicker), FallbackMode::Duplicate);
        for _ in 0..200 {
            let subs = fb.choose_substitutes("서초구");
            assert_eq!(subs.len(), 2);
            assert!(!subs.iter().any(|s| s == "서초구"));
            assert_ne!(subs[0], subs[1]);
        }
    }

    #[test]
    fn every_requested_partition_excluded() {
        let fb = FallbackSearch::new(Box::new(Reversing), FallbackMode::Distinct);
        let subs = fb.choose_substitutes("연남동, 은평구");
        assert_eq!(subs, vec!["서초구".to_string(), "광진구".to_string()]);
    }

    #[test]
    fn repeated_pool_entry_not_picked_twice() {
        let fb = FallbackSearch::new(Box::new(SeochoFirst), FallbackMode::Distinct);
        assert_eq!(fb.choose_substitutes("마포구"), vec!["서초구", "연남동"]);
    }

    #[test]
    fn distinct_mode_searches_two_districts_when_pool_repeats() {
        let catalog = catalog();
        catalog.insert_group(group(3, "p3", "서초구"));
        catalog.insert_room(room("r3", "p3"));
        let fb = FallbackSearch::new(Box::new(SeochoFirst), FallbackMode::Distinct);
        let window = RequestWindow::new(at(18), at(20));
        let ids: Vec<_> = fb
            .search(&catalog, &window, "마포구")
            .iter()
            .map(|r| r.room_group_id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn random_substitutes_always_differ() {
        let fb = FallbackSearch::new(Box::new(RandomPicker), FallbackMode::Distinct);
        for _ in 0..500 {
            let subs = fb.choose_substitutes("마포구");
            assert_eq!(subs.len(), 2);
            assert_ne!(subs[0], subs[1]);
        }
    }

    #[test]
    fn single_remaining_district_yields_one_substitute() {
        let fb = FallbackSearch::new(Box::new(SeochoFirst), FallbackMode::Distinct);
        let all_but_seocho = FALLBACK_PARTITIONS
            .iter()
            .filter(|p| **p != "서초구")
            .copied()
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(fb.choose_substitutes(&all_but_seocho), vec!["서초구"]);
    }

    #[test]
    fn pool_order_without_shuffle() {
        let fb = FallbackSearch::new(Box::new(InOrder), FallbackMode::Distinct);
        assert_eq!(fb.choose_substitutes("마포구"), vec!["연남동", "합정동"]);
        assert_eq!(fb.choose_substitutes("연남동"), vec!["합정동", "강서구"]);
    }

    #[test]
    fn duplicate_mode_queries_first_substitute_twice() {
        let fb = FallbackSearch::new(Box::new(InOrder), FallbackMode::Duplicate);
        let window = RequestWindow::new(at(18), at(20));
        let rooms = fb.search(&catalog(), &window, "마포구");
        // Substitutes are 연남동 and 합정동; only 연남동 is searched, twice.
        assert_eq!(rooms.len(), 2);
        assert!(rooms.iter().all(|r| r.room_group_id == 1));
    }

    #[test]
    fn distinct_mode_queries_both_substitutes() {
        let fb = FallbackSearch::new(Box::new(InOrder), FallbackMode::Distinct);
        let window = RequestWindow::new(at(18), at(20));
        let rooms = fb.search(&catalog(), &window, "마포구");
        let ids: Vec<_> = rooms.iter().map(|r| r.room_group_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn empty_catalog_is_empty_answer() {
        let fb = FallbackSearch::new(Box::new(RandomPicker), FallbackMode::Duplicate);
        let window = RequestWindow::new(at(18), at(20));
        assert!(fb.search(&InMemoryCatalog::new(), &window, "마포구").is_empty());
    }

    #[test]
    fn random_picker_is_a_permutation() {
        let mut items: Vec<String> = FALLBACK_PARTITIONS.iter().map(|s| s.to_string()).collect();
        RandomPicker.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        let mut expected: Vec<String> = FALLBACK_PARTITIONS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn fallback_mode_parses() {
        assert_eq!("distinct".parse::<FallbackMode>(), Ok(FallbackMode::Distinct));
        assert_eq!(" Duplicate ".parse::<FallbackMode>(), Ok(FallbackMode::Duplicate));
        assert!("both".parse::<FallbackMode>().is_err());
    }
}
