// Render window domain model
use super::panel::Panel;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Time range for one export cycle, as local date-times in `time_zone`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: Tz,
}

impl FetchWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, time_zone: Tz) -> Self {
        Self {
            start,
            end,
            time_zone,
        }
    }

    /// From local midnight today until `now`, both seen from `time_zone`
    pub fn today(now: DateTime<Utc>, time_zone: Tz) -> Self {
        let local_now = now.with_timezone(&time_zone).naive_local();
        let midnight = local_now.date().and_time(chrono::NaiveTime::MIN);
        Self::new(midnight, local_now, time_zone)
    }

    /// Window start for a panel, shifted back by its relative time if it has one.
    /// `None` when the shift leaves the representable date range.
    pub fn effective_start(&self, panel: &Panel) -> Option<NaiveDateTime> {
        match panel.relative_time {
            Some(offset) => self.start.checked_sub_signed(offset),
            None => Some(self.start),
        }
    }

    pub fn from_millis(&self, panel: &Panel) -> Option<i64> {
        self.effective_start(panel)
            .map(|start| epoch_millis(start, self.time_zone))
    }

    pub fn to_millis(&self) -> i64 {
        epoch_millis(self.end, self.time_zone)
    }

    pub fn time_zone_id(&self) -> &'static str {
        self.time_zone.name()
    }
}

/// Epoch milliseconds of a local date-time in `time_zone`.
/// Ambiguous times resolve to the earlier instant; times inside a DST gap
/// are pushed forward by one hour.
pub fn epoch_millis(local: NaiveDateTime, time_zone: Tz) -> i64 {
    match time_zone.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        LocalResult::None => time_zone
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| local.and_utc().timestamp_millis()),
    }
}
