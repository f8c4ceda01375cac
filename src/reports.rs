use crate::types::{
    AggregatedRow, BucketSeries, CheckAction, CheckEvent, Facility, FacilityCounts, FilterState,
    Granularity,
};
use crate::util::next_month;
use chrono::{Datelike, Days, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Single pass over the filtered set: one counter per venue plus the total.
pub fn facility_counts(events: &[CheckEvent]) -> FacilityCounts {
    let mut counts = FacilityCounts::default();
    for e in events {
        match e.facility {
            Facility::Outdoor => counts.outdoor += 1,
            Facility::Badminton => counts.badminton += 1,
            Facility::Pool => counts.pool += 1,
            Facility::Track => counts.track += 1,
        }
        counts.total += 1;
    }
    counts
}

/// Summarize the filtered set as one row per (session date, venue) pair,
/// sorted by date then venue display name. Pairs with no events never appear,
/// so every count is strictly positive.
pub fn aggregate_rows(events: &[CheckEvent]) -> Vec<AggregatedRow> {
    let mut map: BTreeMap<(NaiveDate, &'static str), usize> = BTreeMap::new();
    for e in events {
        *map.entry((e.session_date, e.facility.display_name()))
            .or_insert(0) += 1;
    }
    map.into_iter()
        .map(|((date, name), count)| AggregatedRow {
            session_date: date.to_string(),
            facility_name: name.to_string(),
            count,
        })
        .collect()
}

/// Enumerate the full label sequence for the requested range, observed data
/// or not, so empty buckets render as zero.
///
/// Hour mode restarts at every query and always spans the whole clock
/// (00:00..23:00). The calendar modes cover [from, to] inclusive; an
/// inverted range yields no labels, which in turn drops every record from
/// the series view.
pub fn bucket_labels(granularity: Granularity, from: NaiveDate, to: NaiveDate) -> Vec<String> {
    match granularity {
        Granularity::Hour => (0..24).map(|h| format!("{:02}:00", h)).collect(),
        Granularity::Day => {
            let mut labels = Vec::new();
            let mut d = from;
            while d <= to {
                labels.push(d.to_string());
                d = match d.checked_add_days(Days::new(1)) {
                    Some(next) => next,
                    None => break,
                };
            }
            labels
        }
        Granularity::Month => {
            let mut labels = Vec::new();
            if from > to {
                return labels;
            }
            let mut d = from.with_day(1).unwrap_or(from);
            while d <= to {
                labels.push(d.format("%Y-%m").to_string());
                d = next_month(d);
            }
            labels
        }
        Granularity::Year => {
            if from > to {
                return Vec::new();
            }
            (from.year()..=to.year()).map(|y| y.to_string()).collect()
        }
    }
}

/// Bucket key for one event, produced with the same labeling rule as
/// `bucket_labels`. Hours come from the raw timestamp; the calendar modes
/// use the session date, which is what attributes near-midnight events to
/// the right reporting day.
pub fn bucket_key(granularity: Granularity, event: &CheckEvent) -> String {
    match granularity {
        Granularity::Hour => event.ts.format("%H:00").to_string(),
        Granularity::Day => event.session_date.to_string(),
        Granularity::Month => event.session_date.format("%Y-%m").to_string(),
        Granularity::Year => event.session_date.format("%Y").to_string(),
    }
}

/// Build the time series for the active filter.
///
/// Records whose bucket key has no matching label are silently dropped; they
/// can only occur when a timestamp falls outside the displayed range once
/// bucketed, which is not an error. The pool tracks check-outs in a parallel
/// series; every other venue counts as check-ins only.
pub fn bucket_series(events: &[CheckEvent], filter: &FilterState) -> BucketSeries {
    let labels = bucket_labels(filter.granularity, filter.from, filter.to);
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    let track_out = filter.facility == Some(Facility::Pool);
    let mut data_in = vec![0u64; labels.len()];
    let mut data_out = if track_out {
        Some(vec![0u64; labels.len()])
    } else {
        None
    };

    for e in events {
        let key = bucket_key(filter.granularity, e);
        let Some(&i) = index.get(key.as_str()) else {
            continue;
        };
        if e.facility == Facility::Pool && e.action == CheckAction::Out {
            if let Some(out) = data_out.as_mut() {
                out[i] += 1;
            }
            // Without a parallel series there is nowhere to put a pool
            // check-out; it stays out of the "in" counts.
            continue;
        }
        data_in[i] += 1;
    }

    BucketSeries {
        labels,
        data_in,
        data_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn event(ts: &str, facility: Facility, action: CheckAction) -> CheckEvent {
        let ts = crate::util::parse_ts_safe(Some(ts)).unwrap();
        CheckEvent {
            ts,
            session_date: ts.date(),
            facility,
            action,
        }
    }

    fn one_per_facility() -> Vec<CheckEvent> {
        Facility::ALL
            .iter()
            .map(|&f| event("2024-01-01T10:00", f, CheckAction::In))
            .collect()
    }

    #[test]
    fn facility_counts_sum_to_total() {
        let events = one_per_facility();
        let counts = facility_counts(&events);
        assert_eq!(counts.total, 4);
        assert_eq!(
            counts.outdoor + counts.badminton + counts.pool + counts.track,
            counts.total
        );
    }

    #[test]
    fn facility_counts_empty_set() {
        let counts = facility_counts(&[]);
        assert_eq!(counts, FacilityCounts::default());
    }

    #[test]
    fn hour_labels_always_cover_the_clock() {
        let labels = bucket_labels(Granularity::Hour, date("2024-01-01"), date("2024-01-01"));
        assert_eq!(labels.len(), 24);
        assert_eq!(labels[0], "00:00");
        assert_eq!(labels[23], "23:00");
    }

    #[test]
    fn day_labels_span_the_range_inclusive() {
        let labels = bucket_labels(Granularity::Day, date("2024-01-30"), date("2024-02-02"));
        assert_eq!(
            labels,
            vec!["2024-01-30", "2024-01-31", "2024-02-01", "2024-02-02"]
        );
    }

    #[test]
    fn month_labels_cross_year_boundary() {
        let labels = bucket_labels(Granularity::Month, date("2023-11-15"), date("2024-02-10"));
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn year_labels_inclusive() {
        let labels = bucket_labels(Granularity::Year, date("2022-06-01"), date("2024-01-01"));
        assert_eq!(labels, vec!["2022", "2023", "2024"]);
    }

    #[test]
    fn inverted_range_yields_no_calendar_labels() {
        for g in [Granularity::Day, Granularity::Month, Granularity::Year] {
            assert!(bucket_labels(g, date("2024-02-01"), date("2024-01-01")).is_empty());
        }
    }

    #[test]
    fn pool_hour_series_splits_in_and_out() {
        // Scenario: single day, pool selected, one check-in at 08:00 and one
        // check-out at 17:00.
        let events = vec![
            event("2024-01-01T08:00", Facility::Pool, CheckAction::In),
            event("2024-01-01T17:00", Facility::Pool, CheckAction::Out),
        ];
        let mut filter = FilterState::new(date("2024-01-01"), date("2024-01-01"));
        filter.facility = Some(Facility::Pool);
        filter.granularity = Granularity::Hour;

        let series = bucket_series(&events, &filter);
        let out = series.data_out.expect("pool gets a parallel out series");
        assert_eq!(series.data_in[8], 1);
        assert_eq!(out[17], 1);
        assert_eq!(series.data_in.iter().sum::<u64>(), 1);
        assert_eq!(out.iter().sum::<u64>(), 1);
    }

    #[test]
    fn non_pool_facility_has_no_out_series() {
        let events = vec![event("2024-01-01T08:00", Facility::Track, CheckAction::In)];
        let mut filter = FilterState::new(date("2024-01-01"), date("2024-01-01"));
        filter.facility = Some(Facility::Track);
        filter.granularity = Granularity::Hour;

        let series = bucket_series(&events, &filter);
        assert!(series.data_out.is_none());
        assert_eq!(series.data_in[8], 1);
    }

    #[test]
    fn records_outside_labels_are_dropped_but_counts_survive() {
        // Inverted range: every record falls out of the series view, yet the
        // un-bucketed totals still see them.
        let events = one_per_facility();
        let mut filter = FilterState::new(date("2024-02-01"), date("2024-01-01"));
        filter.granularity = Granularity::Day;

        let series = bucket_series(&events, &filter);
        assert!(series.labels.is_empty());
        assert!(series.data_in.is_empty());
        assert_eq!(facility_counts(&events).total, 4);
    }

    #[test]
    fn aggregate_rows_sorted_by_date_then_name() {
        let mut events = one_per_facility();
        events.push(event("2024-01-02T09:00", Facility::Pool, CheckAction::In));
        events.push(event("2024-01-01T11:00", Facility::Pool, CheckAction::In));

        let rows = aggregate_rows(&events);
        assert_eq!(rows.len(), 5);
        // Dates ascend; within 2024-01-01 names are in lexicographic order.
        let dates: Vec<&str> = rows.iter().map(|r| r.session_date.as_str()).collect();
        let mut sorted_dates = dates.clone();
        sorted_dates.sort();
        assert_eq!(dates, sorted_dates);
        let day1: Vec<&str> = rows
            .iter()
            .filter(|r| r.session_date == "2024-01-01")
            .map(|r| r.facility_name.as_str())
            .collect();
        let mut sorted_names = day1.clone();
        sorted_names.sort();
        assert_eq!(day1, sorted_names);
        // The doubled pool visit on day one is a single row with count 2.
        let pool_day1 = rows
            .iter()
            .find(|r| r.session_date == "2024-01-01" && r.facility_name == "สระว่ายน้ำ")
            .unwrap();
        assert_eq!(pool_day1.count, 2);
        assert!(rows.iter().all(|r| r.count > 0));
    }
}
