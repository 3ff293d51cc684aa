// Shared constants for the analysis core

// Level names every categorizer resolves to when a lookup misses
pub const FALLBACK_LEVEL: &str = "Other";
pub const NO_LABEL_LEVEL: &str = "No_Label";

// Key the mapping tables use for an absent label value
pub const NULL_SENTINEL: &str = "null";

// Label kinds attached to fault events by the labeling models
pub const CAVITY_LABEL: &str = "cavity";
pub const FAULT_TYPE_LABEL: &str = "fault-type";

// Facet used when heat maps are not split
pub const ALL_FACET: &str = "All";
pub const UNKNOWN_FACET: &str = "Unknown";

// Half-width of the uniform jitter added to dot-plot ordinals
pub const JITTER_HALF_WIDTH: f64 = 0.05;

// Time axis is in milliseconds, spectra are reported in Hertz
pub const MS_PER_SECOND: f64 = 1000.0;

// Fewest windowed rows the sampling-rate estimate can use: fs = 1000 / (t[2] - t[1])
pub const MIN_WINDOW_ROWS: usize = 3;

// Accepted layouts of `datetime_utc`, tried in order
pub const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];
pub const DATE_FORMAT: &str = "%Y-%m-%d";
