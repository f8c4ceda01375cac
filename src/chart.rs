use crate::types::{BucketSeries, Facility, FacilityCounts, FilterState};
use anyhow::{Context, Result};
use charming::component::{Axis, Legend, Title};
use charming::element::AxisType;
use charming::series::{Bar, Pie};
use charming::{Chart, HtmlRenderer};
use std::path::{Path, PathBuf};

/// What the renderer is handed. The chart library is an opaque back end; the
/// report's contract is this data, not the library's behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartData {
    /// Proportion over the four venues, used when no facility is selected.
    /// Values follow `Facility::ALL` order.
    Pie {
        labels: Vec<&'static str>,
        values: Vec<u64>,
    },
    /// Time series over the bucket labels, used when one venue is selected.
    /// The pool contributes two series (in/out); everything else one.
    Bar {
        labels: Vec<String>,
        series: Vec<(String, Vec<u64>)>,
    },
}

/// Pick the visualization for the current filter and hand over the matching
/// slice of the aggregated snapshot.
pub fn build_chart_data(
    filter: &FilterState,
    counts: &FacilityCounts,
    series: &BucketSeries,
) -> ChartData {
    match filter.facility {
        None => ChartData::Pie {
            labels: Facility::ALL.iter().map(|f| f.display_name()).collect(),
            values: Facility::ALL.iter().map(|&f| counts.get(f) as u64).collect(),
        },
        Some(_) => {
            let mut s = vec![("เข้า".to_string(), series.data_in.clone())];
            if let Some(out) = &series.data_out {
                s.push(("ออก".to_string(), out.clone()));
            }
            ChartData::Bar {
                labels: series.labels.clone(),
                series: s,
            }
        }
    }
}

/// Output target for the chart. At most one live chart instance is bound to
/// the surface; every render drops the previous one before installing the
/// replacement, so repeated renders never stack overlays.
pub struct ChartSurface {
    path: PathBuf,
    current: Option<Chart>,
}

impl ChartSurface {
    pub fn new(path: PathBuf) -> Self {
        ChartSurface {
            path,
            current: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of chart instances currently bound to the surface (0 or 1).
    pub fn instance_count(&self) -> usize {
        usize::from(self.current.is_some())
    }

    pub fn render(&mut self, data: &ChartData, title: &str) -> Result<()> {
        // Destroy first. Required lifecycle rule, not an optimization.
        self.current = None;

        let chart = to_chart(data, title);
        let mut renderer = HtmlRenderer::new(title, 900, 600);
        renderer
            .save(&chart, &self.path)
            .with_context(|| format!("failed to write chart to {}", self.path.display()))?;
        self.current = Some(chart);
        Ok(())
    }
}

fn to_chart(data: &ChartData, title: &str) -> Chart {
    match data {
        ChartData::Pie { labels, values } => {
            let points: Vec<(f64, &str)> = values
                .iter()
                .zip(labels.iter())
                .map(|(v, l)| (*v as f64, *l))
                .collect();
            Chart::new()
                .title(Title::new().text(title))
                .legend(Legend::new().top("bottom"))
                .series(Pie::new().radius("60%").data(points))
        }
        ChartData::Bar { labels, series } => {
            let mut chart = Chart::new()
                .title(Title::new().text(title))
                .legend(Legend::new().top("bottom"))
                .x_axis(Axis::new().type_(AxisType::Category).data(labels.clone()))
                .y_axis(Axis::new().type_(AxisType::Value));
            for (name, values) in series {
                let points: Vec<i32> = values.iter().map(|v| *v as i32).collect();
                chart = chart.series(Bar::new().name(name).data(points));
            }
            chart
        }
    }
}
