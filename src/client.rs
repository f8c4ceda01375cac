use crate::types::{CheckAction, CheckEvent, CheckinRow, Facility, FilterState};
use crate::util::{parse_date_safe, parse_ts_safe};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;
use url::Url;

/// What happened while cleaning a fetched batch.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub total_rows: usize,
    pub parsed_rows: usize,
    pub parse_errors: usize,
}

/// Acknowledgement from the check-event mutation endpoint.
#[derive(Debug, Deserialize)]
pub struct CheckAck {
    pub ok: bool,
    pub id: Option<i64>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Thin client over the facility backend. The query endpoint is read-only;
/// the check-event endpoint mutates and therefore carries the anti-forgery
/// token in a header, same as the kiosk pages do.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base: Url,
    csrf_token: Option<String>,
}

impl ApiClient {
    pub fn new(base: Url, csrf_token: Option<String>) -> Self {
        ApiClient {
            http: reqwest::blocking::Client::new(),
            base,
            csrf_token,
        }
    }

    /// GET `/api/checkins/` for the filter's date range and facility.
    ///
    /// A non-success status is treated as "no data" for this render cycle,
    /// matching the page behavior; only transport errors propagate.
    pub fn fetch_checkins(
        &self,
        filter: &FilterState,
    ) -> Result<(Vec<CheckEvent>, FetchReport)> {
        let url = self
            .base
            .join("api/checkins/")
            .context("invalid base url")?;
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&checkins_query(filter))
            .send()
            .context("checkins request failed")?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "checkins query returned non-success, treating as empty");
            return Ok((
                Vec::new(),
                FetchReport {
                    total_rows: 0,
                    parsed_rows: 0,
                    parse_errors: 0,
                },
            ));
        }

        let rows: Vec<CheckinRow> = resp.json().context("checkins response was not JSON")?;
        Ok(clean_rows(rows))
    }

    /// POST a check-in/check-out event the way the kiosk pages do: form body,
    /// anti-forgery token echoed in `X-CSRFToken`.
    ///
    /// A rejected event (bad request, pool checkout without check-in) comes
    /// back as an error carrying the server's message.
    pub fn post_check_event(&self, facility: Facility, action: CheckAction) -> Result<CheckAck> {
        let url = self
            .base
            .join("api/check-event/")
            .context("invalid base url")?;
        let mut req = self
            .http
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("facility", facility.key()), ("action", action.key())]);
        if let Some(token) = &self.csrf_token {
            req = req.header("X-CSRFToken", token.clone());
        }
        let resp = req.send().context("check-event request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("check event rejected: HTTP {}: {}", status, body.trim());
        }
        let ack: CheckAck = resp.json().context("check-event response was not JSON")?;
        Ok(ack)
    }
}

/// Query parameters for the checkins endpoint. An empty facility means "all",
/// same convention as the page.
pub fn checkins_query(filter: &FilterState) -> Vec<(&'static str, String)> {
    vec![
        ("from", filter.from.to_string()),
        ("to", filter.to.to_string()),
        (
            "facility",
            filter
                .facility
                .map(|f| f.key().to_string())
                .unwrap_or_default(),
        ),
    ]
}

/// Convert raw wire rows into typed events, dropping anything unparseable.
///
/// A missing action defaults to a check-in; only the pool sends "out".
pub fn clean_rows(rows: Vec<CheckinRow>) -> (Vec<CheckEvent>, FetchReport) {
    let total_rows = rows.len();
    let mut parse_errors = 0usize;
    let mut events: Vec<CheckEvent> = Vec::with_capacity(total_rows);

    for row in rows {
        let ts = match parse_ts_safe(row.ts.as_deref()) {
            Some(t) => t,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let session_date = match parse_date_safe(row.session_date.as_deref()) {
            Some(d) => d,
            None => ts.date(),
        };
        let facility = match row.facility.as_deref().and_then(Facility::from_key) {
            Some(f) => f,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let action = row
            .action
            .as_deref()
            .and_then(CheckAction::from_key)
            .unwrap_or(CheckAction::In);
        events.push(CheckEvent {
            ts,
            session_date,
            facility,
            action,
        });
    }

    let parsed_rows = events.len();
    (
        events,
        FetchReport {
            total_rows,
            parsed_rows,
            parse_errors,
        },
    )
}

/// Client-side pass over the fetched rows: re-check the facility constraint
/// and match the free-text query against the Thai display name,
/// case-insensitively.
pub fn apply_text_filter(events: &[CheckEvent], filter: &FilterState) -> Vec<CheckEvent> {
    let q = filter.query.trim().to_lowercase();
    events
        .iter()
        .filter(|e| {
            let ok_fac = filter.facility.map_or(true, |f| e.facility == f);
            ok_fac && (q.is_empty() || e.facility.display_name().to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Granularity;
    use chrono::NaiveDate;

    fn filter(from: &str, to: &str) -> FilterState {
        FilterState::new(
            NaiveDate::parse_from_str(from, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(to, "%Y-%m-%d").unwrap(),
        )
    }

    fn event(facility: Facility) -> CheckEvent {
        CheckEvent {
            ts: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            session_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            facility,
            action: CheckAction::In,
        }
    }

    #[test]
    fn query_includes_empty_facility_for_all() {
        let f = filter("2024-01-01", "2024-01-31");
        let q = checkins_query(&f);
        assert_eq!(
            q,
            vec![
                ("from", "2024-01-01".to_string()),
                ("to", "2024-01-31".to_string()),
                ("facility", String::new()),
            ]
        );
    }

    #[test]
    fn query_carries_selected_facility_key() {
        let mut f = filter("2024-01-01", "2024-01-01");
        f.facility = Some(Facility::Pool);
        f.granularity = Granularity::Hour;
        let q = checkins_query(&f);
        assert_eq!(q[2], ("facility", "pool".to_string()));
    }

    #[test]
    fn clean_rows_drops_bad_rows_and_counts_them() {
        let rows = vec![
            CheckinRow {
                ts: Some("2024-01-01T08:00:00+07:00".into()),
                session_date: Some("2024-01-01".into()),
                facility: Some("pool".into()),
                action: Some("in".into()),
            },
            CheckinRow {
                ts: None,
                session_date: Some("2024-01-01".into()),
                facility: Some("pool".into()),
                action: Some("in".into()),
            },
            CheckinRow {
                ts: Some("2024-01-01T09:00:00".into()),
                session_date: Some("2024-01-01".into()),
                facility: Some("squash".into()),
                action: None,
            },
        ];
        let (events, report) = clean_rows(rows);
        assert_eq!(events.len(), 1);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.parsed_rows, 1);
        assert_eq!(report.parse_errors, 2);
    }

    #[test]
    fn clean_rows_defaults_missing_action_to_in() {
        let rows = vec![CheckinRow {
            ts: Some("2024-01-01T10:00:00".into()),
            session_date: None,
            facility: Some("track".into()),
            action: None,
        }];
        let (events, _) = clean_rows(rows);
        assert_eq!(events[0].action, CheckAction::In);
        // session_date falls back to the timestamp's date
        assert_eq!(
            events[0].session_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn text_query_matches_thai_display_name() {
        // "สระ" is a substring of the pool's display name only.
        let events = vec![
            event(Facility::Outdoor),
            event(Facility::Pool),
            event(Facility::Badminton),
            event(Facility::Track),
        ];
        let mut f = filter("2024-01-01", "2024-01-01");
        f.query = "สระ".to_string();
        let kept = apply_text_filter(&events, &f);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].facility, Facility::Pool);
    }

    #[test]
    fn facility_filter_is_rechecked_client_side() {
        let events = vec![event(Facility::Outdoor), event(Facility::Pool)];
        let mut f = filter("2024-01-01", "2024-01-01");
        f.facility = Some(Facility::Pool);
        let kept = apply_text_filter(&events, &f);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].facility, Facility::Pool);
    }
}
