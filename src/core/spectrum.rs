// Windowed magnitude spectra of time series tables

use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;
use tracing::debug;

use crate::core::constants::{MIN_WINDOW_ROWS, MS_PER_SECOND};
use crate::core::error::{Result, WfbError};
use crate::core::table::{SeriesChart, TimeSeriesTable};

/// One-sided magnitude spectrum, one entry per retained bin `0..=n_freq`.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralResult {
    /// Windowed sample count the transform ran over
    pub samples: usize,
    // Hz
    pub sample_rate: f64,
    pub n_freq: usize,
    pub frequencies: Vec<f64>,
    /// `magnitudes[column][bin]`. Bin 0 is never filled.
    pub magnitudes: Vec<Vec<Option<f64>>>,
}

impl SpectralResult {
    /// Row-major layout `[frequency, m1, ..., mN]`.
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        self.frequencies
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let mut row = Vec::with_capacity(self.magnitudes.len() + 1);
                row.push(Some(f));
                row.extend(self.magnitudes.iter().map(|m| m[i]));
                row
            })
            .collect()
    }

    /// Bin with the largest magnitude in `column`, first one on ties.
    pub fn peak_bin(&self, column: usize) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, m) in self.magnitudes.get(column)?.iter().enumerate() {
            if let Some(m) = *m {
                if best.map_or(true, |(_, b)| m > b) {
                    best = Some((i, m));
                }
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Number of the last retained bin for `n` samples. Even counts keep one
/// extra bin so the Nyquist frequency is included.
pub fn retained_bins(n: usize) -> usize {
    n / 2 + if n % 2 == 0 { 1 } else { 0 }
}

/// Spectrum of the rows of `table` enclosed by `[start, end]` (ms).
pub fn windowed_spectrum(table: &TimeSeriesTable, start: f64, end: f64) -> Result<SpectralResult> {
    let window = table.window(start, end)?;
    let n = window.len();
    if n < MIN_WINDOW_ROWS {
        return Err(WfbError::window(
            start,
            end,
            format!("{} rows in window, at least {} required", n, MIN_WINDOW_ROWS),
        ));
    }

    let time = window.time();
    let fs = MS_PER_SECOND / (time[2] - time[1]);
    let n_freq = retained_bins(n);

    let frequencies: Vec<f64> = (0..=n_freq).map(|i| i as f64 * fs / n as f64).collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut magnitudes = Vec::with_capacity(window.column_count());
    for column in window.columns() {
        // Missing samples contribute nothing
        let mut buffer: Vec<Complex<f64>> = column
            .iter()
            .map(|&v| Complex::new(if v.is_nan() { 0.0 } else { v }, 0.0))
            .collect();
        fft.process(&mut buffer);

        // DC stays unset, as the chart has always shown it
        let mut spectrum = vec![None; n_freq + 1];
        for (i, slot) in spectrum.iter_mut().enumerate().skip(1) {
            *slot = Some(buffer[i].norm());
        }
        magnitudes.push(spectrum);
    }

    debug!(
        "spectrum over {} samples at {:.3} Hz: {} bins x {} columns",
        n,
        fs,
        n_freq + 1,
        magnitudes.len()
    );

    Ok(SpectralResult {
        samples: n,
        sample_rate: fs,
        n_freq,
        frequencies,
        magnitudes,
    })
}

pub fn full_spectrum(table: &TimeSeriesTable) -> Result<SpectralResult> {
    match (table.time().first(), table.time().last()) {
        (Some(&start), Some(&end)) => windowed_spectrum(table, start, end),
        _ => Err(WfbError::window(f64::NAN, f64::NAN, "table is empty")),
    }
}

/// Spectrum of one chart, labeled for a line renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpectrum {
    pub title: String,
    /// `Frequency (Hz)` followed by the chart's column labels
    pub labels: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
    #[serde(skip)]
    pub result: SpectralResult,
}

impl SeriesChart {
    pub fn spectrum(&self, start: f64, end: f64) -> Result<ChartSpectrum> {
        Ok(self.labeled_spectrum(windowed_spectrum(&self.table, start, end)?))
    }

    /// Missing bounds default to the chart's first and last time.
    pub fn spectrum_range(&self, start: Option<f64>, end: Option<f64>) -> Result<ChartSpectrum> {
        let time = self.table.time();
        match (start, end, time.first(), time.last()) {
            (None, None, _, _) => Ok(self.labeled_spectrum(full_spectrum(&self.table)?)),
            (start, end, Some(&first), Some(&last)) => {
                self.spectrum(start.unwrap_or(first), end.unwrap_or(last))
            }
            (start, end, _, _) => Err(WfbError::window(
                start.unwrap_or(f64::NAN),
                end.unwrap_or(f64::NAN),
                "table is empty",
            )),
        }
    }

    fn labeled_spectrum(&self, result: SpectralResult) -> ChartSpectrum {
        let mut labels = Vec::with_capacity(self.labels.len());
        labels.push("Frequency (Hz)".to_string());
        labels.extend(self.labels.iter().skip(1).cloned());

        ChartSpectrum {
            title: format!("{} FFT", self.series),
            labels,
            rows: result.to_rows(),
            result,
        }
    }
}
