use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::model::Slot;

/// Wire format of one scraped time slot.
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse one scraped slot string. Malformed input is not an error, just no slot.
///
/// Every field is fixed width (`09:00`, never `9:00`). Out-of-range values that
/// still fit their field are resolved rather than rejected: a day past the end
/// of its month clamps to the last day (`2024-02-30` is `2024-02-29`), and
/// `24:00` is midnight of the next day.
pub fn parse_slot(raw: &str) -> Option<Slot> {
    let s = raw.trim();
    let slot = SlotFields::split(s).and_then(|fields| {
        NaiveDateTime::parse_from_str(s, SLOT_FORMAT)
            .ok()
            .or_else(|| fields.resolve())
    });
    if slot.is_none() {
        debug!("dropping unparsable slot {raw:?}");
    }
    slot
}

/// Numeric fields of `yyyy-MM-dd HH:mm`, range-checked only per field.
struct SlotFields {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
}

impl SlotFields {
    fn split(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() != 16 || b[4] != b'-' || b[7] != b'-' || b[10] != b' ' || b[13] != b':' {
            return None;
        }
        let num = |from: usize, to: usize| -> Option<u32> {
            let digits = &b[from..to];
            digits
                .iter()
                .all(u8::is_ascii_digit)
                .then(|| digits.iter().fold(0, |n, d| n * 10 + u32::from(d - b'0')))
        };
        Some(Self {
            year: i32::try_from(num(0, 4)?).ok()?,
            month: num(5, 7)?,
            day: num(8, 10)?,
            hour: num(11, 13)?,
            minute: num(14, 16)?,
        })
    }

    fn resolve(&self) -> Option<Slot> {
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) || self.minute > 59 {
            return None;
        }
        let (hour, next_day) = match self.hour {
            0..=23 => (self.hour, false),
            24 if self.minute == 0 => (0, true),
            _ => return None,
        };

        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let last_day = first.checked_add_months(Months::new(1))?.pred_opt()?.day();
        let mut date = first.with_day(self.day.min(last_day))?;
        if next_day {
            date = date.succ_opt()?;
        }
        date.and_hms_opt(hour, self.minute, 0)
    }
}

/// Parse a batch, keeping input order and skipping entries that do not parse.
pub fn normalize_slots<'a, I>(raw: I) -> Vec<Slot>
where
    I: IntoIterator<Item = &'a String>,
{
    raw.into_iter().filter_map(|s| parse_slot(s)).collect()
}
