// Categorical summaries of labeled fault events: jittered dot plots and faceted heat maps

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::core::categorizer::{Categorizer, Tick, UnmappedLabels};
use crate::core::constants::{ALL_FACET, JITTER_HALF_WIDTH, UNKNOWN_FACET};
use crate::core::format::LabeledEvent;

/// Which part of an event a categorical axis is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventField {
    Cavity,
    #[serde(alias = "fault-type")]
    Fault,
    Zone,
}

impl EventField {
    pub fn raw_value<'a>(&self, event: &'a LabeledEvent) -> Option<&'a str> {
        match self {
            EventField::Cavity => event.cavity(),
            EventField::Fault => event.fault_type(),
            EventField::Zone => Some(event.location.as_str()),
        }
    }

    pub fn is_label(&self) -> bool {
        !matches!(self, EventField::Zone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetSelector {
    #[default]
    None,
    Linac,
    Zone,
}

impl FromStr for FacetSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FacetSelector::None),
            "linac" => Ok(FacetSelector::Linac),
            "zone" => Ok(FacetSelector::Zone),
            other => Err(format!("unknown facet '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linac {
    Injector,
    North,
    South,
}

impl Linac {
    /// Linac a zone belongs to, from its `0L`/`1L`/`2L` prefix.
    pub fn from_zone(zone: &str) -> Option<Self> {
        match zone.get(..2)? {
            "0L" => Some(Linac::Injector),
            "1L" => Some(Linac::North),
            "2L" => Some(Linac::South),
            _ => None,
        }
    }

    pub fn facet_name(&self) -> &'static str {
        match self {
            Linac::Injector => "INJ",
            Linac::North => "NL",
            Linac::South => "SL",
        }
    }
}

impl FacetSelector {
    /// Facet an event at `location` is counted under.
    pub fn facet_for(&self, location: &str) -> String {
        match self {
            FacetSelector::None => ALL_FACET.to_string(),
            FacetSelector::Linac => Linac::from_zone(location)
                .map(|l| l.facet_name())
                .unwrap_or(UNKNOWN_FACET)
                .to_string(),
            FacetSelector::Zone => location.to_string(),
        }
    }

    /// Facet a configured location must always produce, if any. The injector
    /// has no usable labeling model and is never forced in.
    pub fn expected_facet(&self, location: &str) -> Option<String> {
        match self {
            FacetSelector::None => Some(ALL_FACET.to_string()),
            FacetSelector::Linac => match Linac::from_zone(location)? {
                Linac::Injector => None,
                linac => Some(linac.facet_name().to_string()),
            },
            FacetSelector::Zone => match Linac::from_zone(location) {
                Some(Linac::Injector) => None,
                _ => Some(location.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryContext {
    pub labeled_only: bool,
    pub facet_on: FacetSelector,
    /// Every location the selection covers, matched or not
    pub locations: Vec<String>,
}

impl Default for SummaryContext {
    fn default() -> Self {
        Self {
            labeled_only: true,
            facet_on: FacetSelector::None,
            locations: Vec::new(),
        }
    }
}

// Row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMatrix {
    rows: usize,
    cols: usize,
    counts: Vec<u32>,
}

impl CountMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            counts: vec![0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.counts[row * self.cols + col]
    }

    pub fn increment(&mut self, row: usize, col: usize) {
        self.counts[row * self.cols + col] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.counts
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|r| r.to_vec())
            .collect()
    }
}

impl Serialize for CountMatrix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_rows())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatMaps {
    pub facets: BTreeMap<String, CountMatrix>,
    pub unmapped_labels: UnmappedLabels,
}

impl HeatMaps {
    pub fn get(&self, facet: &str) -> Option<&CountMatrix> {
        self.facets.get(facet)
    }

    pub fn total(&self) -> u64 {
        self.facets.values().map(CountMatrix::total).sum()
    }

    /// Upper bound for a shared, zero-based color scale. Never below 1.
    pub fn color_scale_max(&self) -> u32 {
        self.facets.values().map(CountMatrix::max).max().unwrap_or(0).max(1)
    }
}

/// Count (row, column) level pairs per facet.
pub fn heat_maps(
    events: &[LabeledEvent],
    columns: EventField,
    column_mapper: &Categorizer,
    rows: EventField,
    row_mapper: &Categorizer,
    ctx: &SummaryContext,
) -> HeatMaps {
    let n_rows = row_mapper.len();
    let n_cols = column_mapper.len();
    let mut facets: BTreeMap<String, CountMatrix> = BTreeMap::new();
    let mut unmapped = UnmappedLabels::default();

    for event in events {
        if ctx.labeled_only && !event.is_labeled() {
            continue;
        }

        let col = unmapped.resolve(column_mapper, columns.raw_value(event));
        let row = unmapped.resolve(row_mapper, rows.raw_value(event));

        facets
            .entry(ctx.facet_on.facet_for(&event.location))
            .or_insert_with(|| CountMatrix::zeros(n_rows, n_cols))
            .increment(row, col);
    }

    for location in &ctx.locations {
        if let Some(facet) = ctx.facet_on.expected_facet(location) {
            facets
                .entry(facet)
                .or_insert_with(|| CountMatrix::zeros(n_rows, n_cols));
        }
    }

    debug!(
        "heat maps: {} facets from {} events",
        facets.len(),
        events.len()
    );

    HeatMaps {
        facets,
        unmapped_labels: unmapped,
    }
}

/// One event on a dot plot: a value in its own column slot, `None` elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotPoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub values: Vec<Option<f64>>,
}

impl DotPoint {
    pub fn column(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DotPlot {
    /// `Timestamp` followed by the column levels
    pub labels: Vec<String>,
    pub ticks: Vec<Tick>,
    pub points: Vec<DotPoint>,
    pub unmapped_labels: UnmappedLabels,
}

/// Jittered ordinal points, one per event, sorted by timestamp with
/// undated events last.
pub fn dot_plot<R: Rng + ?Sized>(
    events: &[LabeledEvent],
    columns: EventField,
    column_mapper: &Categorizer,
    values: EventField,
    value_mapper: &Categorizer,
    labeled_only: bool,
    rng: &mut R,
) -> DotPlot {
    let n_columns = column_mapper.len();
    let mut unmapped = UnmappedLabels::default();
    let mut points = Vec::with_capacity(events.len());

    for event in events {
        if labeled_only && columns.is_label() && !event.is_labeled() {
            continue;
        }

        let col = unmapped.resolve(column_mapper, columns.raw_value(event));
        let value = unmapped.resolve(value_mapper, values.raw_value(event));

        let mut slots = vec![None; n_columns];
        slots[col] = Some(value as f64 + rng.gen_range(-JITTER_HALF_WIDTH..JITTER_HALF_WIDTH));
        points.push(DotPoint {
            timestamp: event.timestamp(),
            values: slots,
        });
    }

    // Stable, so equal timestamps keep input order
    points.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut labels = Vec::with_capacity(n_columns + 1);
    labels.push("Timestamp".to_string());
    labels.extend(column_mapper.levels().iter().cloned());

    DotPlot {
        labels,
        ticks: value_mapper.ticker(),
        points,
        unmapped_labels: unmapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::Label;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn event(id: u64, location: &str, ts: Option<&str>, labels: Option<(&str, &str)>) -> LabeledEvent {
        LabeledEvent {
            id,
            location: location.to_string(),
            datetime_utc: ts.map(str::to_string),
            system: Some("rf".to_string()),
            classification: None,
            labels: labels.map(|(cav, fault)| {
                vec![Label::new("cavity", cav), Label::new("fault-type", fault)]
            }),
        }
    }

    fn sample_events() -> Vec<LabeledEvent> {
        vec![
            event(1, "1L22", Some("2020-03-01 10:00:00.0"), Some(("3", "Quench"))),
            event(2, "1L22", Some("2020-03-01 11:00:00.0"), Some(("3", "Quench"))),
            event(3, "2L24", Some("2020-03-01 09:00:00.0"), Some(("multiple", "Multi Cav turn off"))),
            event(4, "2L24", Some("2020-03-02 09:00:00.0"), None),
            event(5, "0L04", Some("2020-03-02 10:00:00.0"), Some(("12", "Quench"))),
        ]
    }

    fn zones() -> Vec<String> {
        Categorizer::zone().levels()[..12].to_vec()
    }

    #[test]
    fn test_facet_selector_parse() {
        assert_eq!("linac".parse::<FacetSelector>(), Ok(FacetSelector::Linac));
        assert_eq!("none".parse::<FacetSelector>(), Ok(FacetSelector::None));
        assert!("cavity".parse::<FacetSelector>().is_err());
        let parsed: FacetSelector = serde_json::from_str("\"zone\"").unwrap();
        assert_eq!(parsed, FacetSelector::Zone);
    }

    #[test]
    fn test_linac_from_zone() {
        assert_eq!(Linac::from_zone("0L04"), Some(Linac::Injector));
        assert_eq!(Linac::from_zone("1L22"), Some(Linac::North));
        assert_eq!(Linac::from_zone("2L26"), Some(Linac::South));
        assert_eq!(Linac::from_zone("3L01"), None);
        assert_eq!(Linac::from_zone("2"), None);
        assert_eq!(Linac::from_zone(""), None);
    }

    #[test]
    fn test_heat_maps_unfaceted() {
        let cav = Categorizer::cavity();
        let fault = Categorizer::fault_type();
        let ctx = SummaryContext {
            labeled_only: true,
            facet_on: FacetSelector::None,
            locations: zones(),
        };

        let maps = heat_maps(&sample_events(), EventField::Cavity, &cav, EventField::Fault, &fault, &ctx);
        assert_eq!(maps.facets.len(), 1);
        let all = maps.get("All").unwrap();
        assert_eq!((all.rows(), all.cols()), (10, 11));

        let quench = fault.numeric_value(Some("Quench"));
        assert_eq!(all.get(quench, 3), 2);
        assert_eq!(all.get(fault.numeric_value(Some("Multi_Cav")), 0), 1);
        assert_eq!(all.get(quench, cav.numeric_value(Some("Other"))), 1);

        // Event 4 is unlabeled and filtered out
        assert_eq!(maps.total(), 4);
        assert_eq!(maps.unmapped_labels.get("12"), 1);
        assert_eq!(maps.color_scale_max(), 2);
    }

    #[test]
    fn test_heat_maps_keep_unlabeled() {
        let cav = Categorizer::cavity();
        let fault = Categorizer::fault_type();
        let ctx = SummaryContext {
            labeled_only: false,
            ..SummaryContext::default()
        };

        let maps = heat_maps(&sample_events(), EventField::Cavity, &cav, EventField::Fault, &fault, &ctx);
        assert_eq!(maps.total(), 5);
        let no_label = (fault.numeric_value(None), cav.numeric_value(None));
        assert_eq!(maps.get("All").unwrap().get(no_label.0, no_label.1), 1);
    }

    #[test]
    fn test_heat_maps_by_linac() {
        let cav = Categorizer::cavity();
        let fault = Categorizer::fault_type();
        let ctx = SummaryContext {
            labeled_only: true,
            facet_on: FacetSelector::Linac,
            locations: zones(),
        };

        let maps = heat_maps(&sample_events(), EventField::Cavity, &cav, EventField::Fault, &fault, &ctx);
        let names: Vec<&str> = maps.facets.keys().map(String::as_str).collect();
        // INJ only appears because an event was counted there
        assert_eq!(names, vec!["INJ", "NL", "SL"]);
        assert_eq!(maps.get("NL").unwrap().total(), 2);
        assert_eq!(maps.get("SL").unwrap().total(), 1);
        assert_eq!(maps.get("INJ").unwrap().total(), 1);
        assert_eq!(maps.total(), 4);
    }

    #[test]
    fn test_heat_maps_zero_filled_zones() {
        let cav = Categorizer::cavity();
        let fault = Categorizer::fault_type();
        let ctx = SummaryContext {
            labeled_only: true,
            facet_on: FacetSelector::Zone,
            locations: zones(),
        };

        let no_events: Vec<LabeledEvent> = Vec::new();
        let maps = heat_maps(&no_events, EventField::Cavity, &cav, EventField::Fault, &fault, &ctx);
        assert_eq!(maps.facets.len(), 11);
        assert!(maps.get("0L04").is_none());
        assert!(maps.facets.values().all(|m| m.total() == 0));
        assert_eq!(maps.color_scale_max(), 1);

        // Duplicate locations collapse to one facet
        let ctx = SummaryContext {
            locations: vec!["1L22".into(), "1L22".into(), "2L22".into()],
            ..ctx
        };
        let maps = heat_maps(&no_events, EventField::Cavity, &cav, EventField::Fault, &fault, &ctx);
        assert_eq!(maps.facets.len(), 2);
    }

    #[test]
    fn test_heat_maps_serialize_row_major() {
        let mut m = CountMatrix::zeros(2, 3);
        m.increment(1, 2);
        m.increment(1, 2);
        m.increment(0, 0);
        assert_eq!(serde_json::to_value(&m).unwrap(), serde_json::json!([[1, 0, 0], [0, 0, 2]]));
    }

    #[test]
    fn test_dot_plot_sorted_nulls_last() {
        let events = vec![
            event(1, "1L22", Some("2024-01-02"), Some(("1", "Quench"))),
            event(2, "1L23", Some("2024-01-01"), Some(("2", "Quench"))),
            event(3, "1L24", None, Some(("3", "Quench"))),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let plot = dot_plot(
            &events,
            EventField::Fault,
            &Categorizer::fault_type(),
            EventField::Cavity,
            &Categorizer::cavity(),
            true,
            &mut rng,
        );

        let order: Vec<Option<String>> = plot
            .points
            .iter()
            .map(|p| p.timestamp.map(|t| t.format("%Y-%m-%d").to_string()))
            .collect();
        assert_eq!(
            order,
            vec![Some("2024-01-01".to_string()), Some("2024-01-02".to_string()), None]
        );

        // Cavity 2 sits at ordinal 2 give or take the jitter
        let first = &plot.points[0];
        let quench = Categorizer::fault_type().numeric_value(Some("Quench"));
        assert_eq!(first.column(), Some(quench));
        let v = first.values[quench].unwrap();
        assert!((v - 2.0).abs() <= JITTER_HALF_WIDTH);
        assert_eq!(first.values.iter().filter(|v| v.is_some()).count(), 1);

        assert_eq!(plot.labels.len(), Categorizer::fault_type().len() + 1);
        assert_eq!(plot.labels[0], "Timestamp");
        assert_eq!(plot.ticks.len(), Categorizer::cavity().len());
    }

    #[test]
    fn test_dot_plot_labeled_only() {
        let events = sample_events();
        let mut rng = StdRng::seed_from_u64(1);
        let fault = Categorizer::fault_type();
        let zone = Categorizer::zone();

        let plot = dot_plot(&events, EventField::Fault, &fault, EventField::Zone, &zone, true, &mut rng);
        assert_eq!(plot.points.len(), 4);

        let plot = dot_plot(&events, EventField::Fault, &fault, EventField::Zone, &zone, false, &mut rng);
        assert_eq!(plot.points.len(), 5);
        let unlabeled = plot
            .points
            .iter()
            .find(|p| p.column() == Some(fault.numeric_value(None)))
            .unwrap();
        let v = unlabeled.values[fault.numeric_value(None)].unwrap();
        assert!((v - zone.numeric_value(Some("2L24")) as f64).abs() <= JITTER_HALF_WIDTH);

        // Zone columns never depend on labels
        let plot = dot_plot(&events, EventField::Zone, &zone, EventField::Cavity, &Categorizer::cavity(), true, &mut rng);
        assert_eq!(plot.points.len(), 5);
    }

    #[test]
    fn test_dot_plot_seeded_is_reproducible() {
        let events = sample_events();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            dot_plot(
                &events,
                EventField::Cavity,
                &Categorizer::cavity(),
                EventField::Zone,
                &Categorizer::zone(),
                true,
                &mut rng,
            )
            .points
        };
        assert_eq!(run(42), run(42));
    }
}
