// Data structures for the JSON documents served by the waveform browser

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::constants::{CAVITY_LABEL, DATETIME_FORMATS, DATE_FORMAT, FAULT_TYPE_LABEL};

/// Per-series metadata attached to a waveform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub name: String,
    #[serde(default)]
    pub units: String,
    #[serde(rename = "y-min", default)]
    pub y_min: Option<f64>,
    #[serde(rename = "y-max", default)]
    pub y_max: Option<f64>,
    #[serde(rename = "seriesId", default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SeriesMetadata {
    pub fn new(name: String) -> Self {
        Self {
            name,
            units: String::new(),
            y_min: None,
            y_max: None,
            series_id: None,
            pattern: None,
            system: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waveform {
    pub waveform_name: String,
    pub dygraph_label: String,
    pub dygraph_id: i64,
    #[serde(default)]
    pub series: Vec<SeriesMetadata>,
    // null entries are samples the capture file did not record
    #[serde(default)]
    pub data_points: Vec<Option<f64>>,
}

impl Waveform {
    pub fn has_series(&self, name: &str) -> bool {
        self.series.iter().any(|s| s.name == name)
    }

    pub fn series(&self, name: &str) -> Option<&SeriesMetadata> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// A single event as returned by the event endpoint in dygraph layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub id: u64,
    #[serde(rename = "datetime_utc", default)]
    pub datetime_utc: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub archive: bool,
    #[serde(default)]
    pub time_offsets: Vec<f64>,
    #[serde(default)]
    pub waveforms: Vec<Waveform>,
}

impl EventPayload {
    /// Accepts either a bare event or the endpoint's `events` wrapper, in
    /// which case the first event is taken.
    pub fn from_json(data: &str) -> crate::Result<Self> {
        if let Ok(list) = serde_json::from_str::<EventPayloadList>(data) {
            if let Some(event) = list.events.into_iter().next() {
                return Ok(event);
            }
        }
        Ok(serde_json::from_str(data)?)
    }
}

/// The event endpoint wraps everything in an `events` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayloadList {
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(rename = "model-name", default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "label-time_utc", default)]
    pub label_time_utc: Option<String>,
}

impl Label {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
            confidence: None,
            model_name: None,
            id: None,
            label_time_utc: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledEvent {
    pub id: u64,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "datetime_utc", default)]
    pub datetime_utc: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    // None means the event was never labeled, which differs from an empty list
    #[serde(default)]
    pub labels: Option<Vec<Label>>,
}

impl LabeledEvent {
    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    /// Value of the named label kind. A repeated kind resolves to its last entry.
    pub fn label(&self, kind: &str) -> Option<&str> {
        self.labels
            .as_ref()?
            .iter()
            .filter(|l| l.name == kind)
            .last()
            .and_then(|l| l.value.as_deref())
    }

    pub fn cavity(&self) -> Option<&str> {
        self.label(CAVITY_LABEL)
    }

    pub fn fault_type(&self) -> Option<&str> {
        self.label(FAULT_TYPE_LABEL)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.datetime_utc.as_deref().and_then(parse_utc)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<LabeledEvent>,
}

impl EventList {
    pub fn from_json(data: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Parse the server's UTC timestamp layout. A trailing `Z` is tolerated and
/// a bare date is taken as midnight.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
