// Waveform browser analysis core
// Windowed spectra of event waveforms and categorical summaries of fault labels

pub mod core;

// Re-export main types
pub use crate::core::aggregate::{
    dot_plot, heat_maps, CountMatrix, DotPlot, DotPoint, EventField, FacetSelector, HeatMaps,
    Linac, SummaryContext,
};
pub use crate::core::categorizer::{Categorizer, Resolution, Tick, UnmappedLabels};
pub use crate::core::error::{Result, WfbError};
pub use crate::core::fetch_guard::{FetchGuard, FetchState};
pub use crate::core::format::{EventList, EventPayload, EventPayloadList, Label, LabeledEvent, SeriesMetadata, Waveform};
pub use crate::core::spectrum::{full_spectrum, retained_bins, windowed_spectrum, ChartSpectrum, SpectralResult};
pub use crate::core::summary::{LabelSummary, TimelineMode, TitledDotPlot};
pub use crate::core::table::{SeriesChart, TimeSeriesTable};

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(FALLBACK_LEVEL, "Other");
        assert_eq!(NO_LABEL_LEVEL, "No_Label");
        assert!(JITTER_HALF_WIDTH > 0.0 && JITTER_HALF_WIDTH < 0.5);
    }
}
