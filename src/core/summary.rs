// Label summary report: heat maps plus the dot plots for a timeline mode

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::core::aggregate::{dot_plot, heat_maps, DotPlot, EventField, HeatMaps, SummaryContext};
use crate::core::categorizer::{Categorizer, UnmappedLabels};
use crate::core::format::LabeledEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineMode {
    /// One zone selected: faults over time, valued by cavity
    Single,
    /// Several zones: faults and cavities over time, valued by zone
    #[default]
    Multi,
}

impl FromStr for TimelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(TimelineMode::Single),
            "multi" => Ok(TimelineMode::Multi),
            other => Err(format!("unknown timeline mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TitledDotPlot {
    pub title: String,
    #[serde(flatten)]
    pub plot: DotPlot,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub heat_maps: HeatMaps,
    pub color_scale_max: u32,
    /// Cavity levels, heat map columns
    pub columns: Vec<String>,
    /// Fault type levels, heat map rows
    pub rows: Vec<String>,
    pub dot_plots: Vec<TitledDotPlot>,
}

impl LabelSummary {
    pub fn build<R: Rng + ?Sized>(
        events: &[LabeledEvent],
        ctx: &SummaryContext,
        mode: TimelineMode,
        rng: &mut R,
    ) -> Self {
        let cavity = Categorizer::cavity();
        let fault = Categorizer::fault_type();
        let zone = Categorizer::zone();

        let heat_maps = heat_maps(events, EventField::Cavity, &cavity, EventField::Fault, &fault, ctx);

        let plots: Vec<(&str, EventField, &Categorizer, EventField, &Categorizer)> = match mode {
            TimelineMode::Single => vec![(
                "Fault Timeline",
                EventField::Fault,
                &fault,
                EventField::Cavity,
                &cavity,
            )],
            TimelineMode::Multi => vec![
                ("Fault Types By Zone", EventField::Fault, &fault, EventField::Zone, &zone),
                ("Cavity By Zone", EventField::Cavity, &cavity, EventField::Zone, &zone),
            ],
        };

        let dot_plots: Vec<TitledDotPlot> = plots
            .into_iter()
            .map(|(title, columns, column_mapper, values, value_mapper)| TitledDotPlot {
                title: title.to_string(),
                plot: dot_plot(
                    events,
                    columns,
                    column_mapper,
                    values,
                    value_mapper,
                    ctx.labeled_only,
                    &mut *rng,
                ),
            })
            .collect();

        let summary = Self {
            color_scale_max: heat_maps.color_scale_max(),
            heat_maps,
            columns: cavity.levels().to_vec(),
            rows: fault.levels().to_vec(),
            dot_plots,
        };

        info!(
            "label summary: {} events, {} facets, {} dot plots, {} unmapped labels",
            events.len(),
            summary.heat_maps.facets.len(),
            summary.dot_plots.len(),
            summary.unmapped_labels().total()
        );

        summary
    }

    /// Fallback tallies across every transform in the report.
    pub fn unmapped_labels(&self) -> UnmappedLabels {
        let mut all = self.heat_maps.unmapped_labels.clone();
        for plot in &self.dot_plots {
            all.merge(plot.plot.unmapped_labels.clone());
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::FacetSelector;
    use crate::core::format::EventList;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EVENTS: &str = r#"{"events": [
        {"id": 1, "location": "1L22", "datetime_utc": "2020-03-01 10:00:00.0",
         "labels": [{"name": "cavity", "value": "4"}, {"name": "fault-type", "value": "Microphonics"}]},
        {"id": 2, "location": "2L23", "datetime_utc": "2020-03-01 08:00:00.0",
         "labels": [{"name": "cavity", "value": "7"}, {"name": "fault-type", "value": "E_Quench"}]},
        {"id": 3, "location": "1L25", "datetime_utc": "2020-03-01 09:00:00.0", "labels": null}
    ]}"#;

    #[test]
    fn test_multi_mode() {
        let events = EventList::from_json(EVENTS).unwrap().events;
        let ctx = SummaryContext {
            labeled_only: true,
            facet_on: FacetSelector::Linac,
            locations: vec!["1L22".into(), "2L23".into(), "1L25".into(), "0L04".into()],
        };
        let mut rng = StdRng::seed_from_u64(3);
        let summary = LabelSummary::build(&events, &ctx, TimelineMode::Multi, &mut rng);

        let titles: Vec<&str> = summary.dot_plots.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Fault Types By Zone", "Cavity By Zone"]);
        assert!(summary.dot_plots.iter().all(|p| p.plot.points.len() == 2));
        assert_eq!(summary.heat_maps.facets.len(), 2);
        assert_eq!(summary.heat_maps.total(), 2);
        assert_eq!(summary.columns.len(), 11);
        assert_eq!(summary.rows.len(), 10);
        assert!(summary.unmapped_labels().is_empty());

        let first = summary.dot_plots[0].plot.points[0].timestamp.unwrap();
        assert_eq!(first.format("%H").to_string(), "08");
    }

    #[test]
    fn test_single_mode_serializes() {
        let events = EventList::from_json(EVENTS).unwrap().events;
        let ctx = SummaryContext {
            labeled_only: false,
            facet_on: FacetSelector::None,
            locations: vec!["1L22".into()],
        };
        let mut rng = StdRng::seed_from_u64(3);
        let summary = LabelSummary::build(&events, &ctx, TimelineMode::Single, &mut rng);

        assert_eq!(summary.dot_plots.len(), 1);
        assert_eq!(summary.dot_plots[0].plot.points.len(), 3);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dot_plots"][0]["title"], "Fault Timeline");
        assert!(json["dot_plots"][0]["points"].is_array());
        assert_eq!(json["heat_maps"]["facets"]["All"].as_array().unwrap().len(), 10);
        assert_eq!(json["color_scale_max"], 1);
    }
}
