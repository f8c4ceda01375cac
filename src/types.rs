use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The four fixed venues. Wire keys are the lowercase ascii identifiers the
/// backend stores; display names are the Thai labels shown on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facility {
    Outdoor,
    Badminton,
    Pool,
    Track,
}

impl Facility {
    pub const ALL: [Facility; 4] = [
        Facility::Outdoor,
        Facility::Badminton,
        Facility::Pool,
        Facility::Track,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Facility::Outdoor => "outdoor",
            Facility::Badminton => "badminton",
            Facility::Pool => "pool",
            Facility::Track => "track",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Facility::Outdoor => "สนามกลางแจ้ง",
            Facility::Badminton => "สนามแบดมินตัน",
            Facility::Pool => "สระว่ายน้ำ",
            Facility::Track => "ลู่และลาน",
        }
    }

    pub fn from_key(s: &str) -> Option<Facility> {
        match s {
            "outdoor" => Some(Facility::Outdoor),
            "badminton" => Some(Facility::Badminton),
            "pool" => Some(Facility::Pool),
            "track" => Some(Facility::Track),
            _ => None,
        }
    }
}

/// Direction of a check event. Only the pool records both directions; the
/// other venues log check-ins only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckAction {
    In,
    Out,
}

impl CheckAction {
    pub fn key(self) -> &'static str {
        match self {
            CheckAction::In => "in",
            CheckAction::Out => "out",
        }
    }

    pub fn from_key(s: &str) -> Option<CheckAction> {
        match s {
            "in" => Some(CheckAction::In),
            "out" => Some(CheckAction::Out),
            _ => None,
        }
    }
}

/// Raw record as the query endpoint returns it. Everything is optional text
/// so a malformed row can be dropped instead of failing the whole response.
#[derive(Debug, Deserialize)]
pub struct CheckinRow {
    pub ts: Option<String>,
    pub session_date: Option<String>,
    pub facility: Option<String>,
    pub action: Option<String>,
}

/// Cleaned, typed event record.
#[derive(Debug, Clone)]
pub struct CheckEvent {
    pub ts: NaiveDateTime,
    /// The logical day the event is attributed to for reporting; near
    /// midnight it can differ from the calendar date of `ts`.
    pub session_date: NaiveDate,
    pub facility: Facility,
    pub action: CheckAction,
}

/// Time-bucket width for the series view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
    Month,
    Year,
}

impl Granularity {
    pub fn key(self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    pub fn from_key(s: &str) -> Option<Granularity> {
        match s {
            "hour" => Some(Granularity::Hour),
            "day" => Some(Granularity::Day),
            "month" => Some(Granularity::Month),
            "year" => Some(Granularity::Year),
            _ => None,
        }
    }
}

/// Everything the user controls on the report view. Mutating any field
/// triggers a re-fetch and re-render.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// `None` means "all facilities".
    pub facility: Option<Facility>,
    /// Free-text match against the facility display name.
    pub query: String,
    pub granularity: Granularity,
}

impl FilterState {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        FilterState {
            from,
            to,
            facility: None,
            query: String::new(),
            granularity: Granularity::Day,
        }
    }

    /// Human-readable range text used in export titles,
    /// e.g. `2024-01-01 - 2024-01-31`.
    pub fn range_text(&self) -> String {
        format!("{} - {}", self.from, self.to)
    }
}

/// Per-facility totals for the stat boxes and the pie chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacilityCounts {
    pub outdoor: usize,
    pub badminton: usize,
    pub pool: usize,
    pub track: usize,
    pub total: usize,
}

impl FacilityCounts {
    pub fn get(&self, facility: Facility) -> usize {
        match facility {
            Facility::Outdoor => self.outdoor,
            Facility::Badminton => self.badminton,
            Facility::Pool => self.pool,
            Facility::Track => self.track,
        }
    }
}

/// One exported summary row: date / venue / visitor count. Column headers
/// match the production spreadsheet exactly.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct AggregatedRow {
    #[serde(rename = "วันที่ (session)")]
    #[tabled(rename = "วันที่ (session)")]
    pub session_date: String,
    #[serde(rename = "ชื่อสนาม")]
    #[tabled(rename = "ชื่อสนาม")]
    pub facility_name: String,
    #[serde(rename = "จำนวนคนเข้าใช้")]
    #[tabled(rename = "จำนวนคนเข้าใช้")]
    pub count: usize,
}

impl AggregatedRow {
    pub const HEADERS: [&'static str; 3] =
        ["วันที่ (session)", "ชื่อสนาม", "จำนวนคนเข้าใช้"];
}

/// Time series over the full label range of the active filter. Zero-count
/// buckets are kept so gaps render as zero instead of disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSeries {
    pub labels: Vec<String>,
    pub data_in: Vec<u64>,
    /// Present only for the pool, which tracks both directions.
    pub data_out: Option<Vec<u64>>,
}

impl BucketSeries {
    pub fn empty() -> Self {
        BucketSeries {
            labels: Vec::new(),
            data_in: Vec::new(),
            data_out: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_keys_round_trip() {
        for f in Facility::ALL {
            assert_eq!(Facility::from_key(f.key()), Some(f));
        }
        assert_eq!(Facility::from_key("gym"), None);
    }

    #[test]
    fn pool_display_name_is_thai() {
        assert_eq!(Facility::Pool.display_name(), "สระว่ายน้ำ");
    }

    #[test]
    fn action_keys_round_trip() {
        assert_eq!(CheckAction::from_key("in"), Some(CheckAction::In));
        assert_eq!(CheckAction::from_key("out"), Some(CheckAction::Out));
        assert_eq!(CheckAction::from_key("borrow"), None);
    }
}
