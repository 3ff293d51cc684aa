// Time series tables and the per-series chart builder

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::core::error::{Result, WfbError};
use crate::core::format::EventPayload;

/// A time axis in milliseconds plus signal columns aligned to it by row.
///
/// Missing samples are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    time: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl TimeSeriesTable {
    pub fn new(time: Vec<f64>, columns: Vec<Vec<f64>>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if column.len() != time.len() {
                return Err(WfbError::InconsistentColumnLength {
                    column: i + 1,
                    expected: time.len(),
                    got: column.len(),
                });
            }
        }

        if let Some(index) = time
            .windows(2)
            .position(|pair| !(pair[1] > pair[0]))
        {
            return Err(WfbError::UnorderedTimeAxis { index: index + 1 });
        }

        Ok(Self { time, columns })
    }

    /// Build from row-major data, `[time, v1, ..., vN]` per row.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1);

        let mut time = Vec::with_capacity(rows.len());
        let mut columns = vec![Vec::with_capacity(rows.len()); width - 1];

        // Ragged rows leave their columns short, which `new` reports
        for row in rows {
            let Some((&t, values)) = row.split_first() else {
                // Column 0 is the time column itself
                return Err(WfbError::InconsistentColumnLength {
                    column: 0,
                    expected: rows.len(),
                    got: rows.iter().filter(|r| !r.is_empty()).count(),
                });
            };
            time.push(t);
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(*value);
            }
        }

        Self::new(time, columns)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row bounds `[lower, upper]` enclosed by the window: the first row at or
    /// after `start` and the last row at or before `end`.
    pub fn window_bounds(&self, start: f64, end: f64) -> Result<(usize, usize)> {
        if !start.is_finite() || !end.is_finite() {
            return Err(WfbError::window(start, end, "bounds must be finite"));
        }
        if start > end {
            return Err(WfbError::window(start, end, "bounds are inverted"));
        }

        // Time is strictly increasing, so both bounds are partition points
        let lower = self.time.partition_point(|&t| t < start);
        let upper = self.time.partition_point(|&t| t <= end);

        if lower >= upper {
            return Err(WfbError::window(
                start,
                end,
                "window does not intersect the time axis",
            ));
        }

        Ok((lower, upper - 1))
    }

    /// Rows enclosed by `[start, end]`, inclusive on both sides.
    pub fn window(&self, start: f64, end: f64) -> Result<TimeSeriesTable> {
        let (lower, upper) = self.window_bounds(start, end)?;
        debug!("window [{}, {}] -> rows {}..={}", start, end, lower, upper);

        Ok(Self {
            time: self.time[lower..=upper].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| c[lower..=upper].to_vec())
                .collect(),
        })
    }

    /// Row-major layout for line renderers. NaN serializes as `null`.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.len())
            .map(|i| {
                let mut row = Vec::with_capacity(self.columns.len() + 1);
                row.push(self.time[i]);
                row.extend(self.columns.iter().map(|c| c[i]));
                row
            })
            .collect()
    }
}

/// Everything needed to draw one series of an event.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesChart {
    pub series: String,
    pub units: String,
    /// `time` followed by one label per data column
    pub labels: Vec<String>,
    pub dygraph_ids: Vec<i64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    #[serde(rename = "data", serialize_with = "serialize_table")]
    pub table: TimeSeriesTable,
}

fn serialize_table<S: serde::Serializer>(
    table: &TimeSeriesTable,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(table.to_rows())
}

impl SeriesChart {
    pub fn from_event(event: &EventPayload, series: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut units = String::new();
        let mut y_min: Option<f64> = None;
        let mut y_max: Option<f64> = None;

        for waveform in &event.waveforms {
            let Some(meta) = waveform.series(series) else {
                continue;
            };

            if !seen_ids.insert(waveform.dygraph_id) {
                warn!(
                    "Plot {}: waveform {} has a duplicate ID '{}'",
                    series, waveform.waveform_name, waveform.dygraph_id
                );
            }

            let column: Vec<f64> = waveform
                .data_points
                .iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            entries.push((waveform.dygraph_label.clone(), waveform.dygraph_id, column));
            units = meta.units.clone();

            if let Some(v) = meta.y_min {
                y_min = Some(y_min.map_or(v, |m| m.min(v)));
            }
            if let Some(v) = meta.y_max {
                y_max = Some(y_max.map_or(v, |m| m.max(v)));
            }
        }

        if entries.is_empty() {
            return Err(WfbError::SeriesNotFound(series.to_string()));
        }

        // Keep data aligned with the sorted labels
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut labels = Vec::with_capacity(entries.len() + 1);
        labels.push("time".to_string());
        let mut dygraph_ids = Vec::with_capacity(entries.len());
        let mut columns = Vec::with_capacity(entries.len());
        for (label, id, column) in entries {
            labels.push(label);
            dygraph_ids.push(id);
            columns.push(column);
        }

        let table = TimeSeriesTable::new(event.time_offsets.clone(), columns)?;
        debug!(
            "chart {} for event {}: {} columns x {} rows",
            series,
            event.id,
            table.column_count(),
            table.len()
        );

        Ok(Self {
            series: series.to_string(),
            units,
            labels,
            dygraph_ids,
            y_min,
            y_max,
            table,
        })
    }
}
