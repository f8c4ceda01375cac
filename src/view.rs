use crate::chart::{build_chart_data, ChartSurface};
use crate::client::{apply_text_filter, ApiClient, FetchReport};
use crate::export;
use crate::reports::{aggregate_rows, bucket_series, facility_counts};
use crate::types::{
    AggregatedRow, BucketSeries, CheckEvent, Facility, FacilityCounts, FilterState,
};
use crate::util::format_int;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lifecycle of the report view. Any filter mutation moves back through
/// `Fetching`; the view then holds `Rendered` until the next mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Fetching,
    Rendered,
}

/// The report view owns all report state explicitly; render functions read
/// from it by reference. A refresh replaces the entire snapshot from a fresh
/// fetch, so failures can leave it stale but never corrupt it.
pub struct ReportView {
    pub filter: FilterState,
    state: ViewState,
    all_rows: Vec<CheckEvent>,
    filtered: Vec<CheckEvent>,
    pub counts: FacilityCounts,
    pub rows: Vec<AggregatedRow>,
    pub series: BucketSeries,
    chart: ChartSurface,
}

impl ReportView {
    pub fn new(filter: FilterState, chart_path: PathBuf) -> Self {
        ReportView {
            filter,
            state: ViewState::Idle,
            all_rows: Vec::new(),
            filtered: Vec::new(),
            counts: FacilityCounts::default(),
            rows: Vec::new(),
            series: BucketSeries::empty(),
            chart: ChartSurface::new(chart_path),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Re-fetch for the current filter and rebuild the whole snapshot.
    ///
    /// A transport failure is swallowed into an empty result set for this
    /// render cycle, matching the page behavior; it is logged, not surfaced.
    pub fn refresh(&mut self, client: &ApiClient) -> Result<FetchReport> {
        self.state = ViewState::Fetching;
        let (events, report) = match client.fetch_checkins(&self.filter) {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "fetch failed, rendering empty result set");
                (
                    Vec::new(),
                    FetchReport {
                        total_rows: 0,
                        parsed_rows: 0,
                        parse_errors: 0,
                    },
                )
            }
        };
        self.install(events)?;
        Ok(report)
    }

    /// Replace the raw row set and re-derive everything from it.
    fn install(&mut self, events: Vec<CheckEvent>) -> Result<()> {
        self.all_rows = events;
        self.apply_filters()
    }

    /// Re-run the client-side filter and every derived consumer (counts,
    /// aggregated rows, time series, chart) from the raw rows already held.
    /// This is what a text-query change triggers; no network round trip.
    pub fn apply_filters(&mut self) -> Result<()> {
        self.filtered = apply_text_filter(&self.all_rows, &self.filter);
        self.counts = facility_counts(&self.filtered);
        self.rows = aggregate_rows(&self.filtered);
        self.series = bucket_series(&self.filtered, &self.filter);
        let data = build_chart_data(&self.filter, &self.counts, &self.series);
        self.chart
            .render(&data, &export::report_title(&self.filter))?;
        self.state = ViewState::Rendered;
        Ok(())
    }

    /// Print the stat boxes and the aggregated table to the terminal.
    pub fn render_summary(&self) {
        println!();
        for f in Facility::ALL {
            println!(
                "  {:<14} {}",
                f.display_name(),
                format_int(self.counts.get(f) as i64)
            );
        }
        println!("  {:<14} {}", "รวม", format_int(self.counts.total as i64));
        export::print_report(&self.rows, &self.counts, &self.filter);
        println!("Chart written to {}\n", self.chart.path().display());
    }

    pub fn print_view(&self) {
        export::print_report(&self.rows, &self.counts, &self.filter);
    }

    /// Write all export artifacts from the current snapshot.
    pub fn export_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        export::export_all(dir, &self.rows, &self.filter)
    }
}
