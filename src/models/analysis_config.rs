use serde::{Deserialize, Serialize};

use wfb_analysis::core::constants::{FALLBACK_LEVEL, NO_LABEL_LEVEL};
use wfb_analysis::{Categorizer, FacetSelector, SummaryContext, TimelineMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub labeled_only: bool,
    pub facet_on: FacetSelector,
    pub timeline_mode: TimelineMode,
    pub locations: Vec<String>,
    pub jitter_seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        // Every zone the zone categorizer knows, without its fallback levels
        let locations = Categorizer::zone()
            .levels()
            .iter()
            .filter(|l| l.as_str() != FALLBACK_LEVEL && l.as_str() != NO_LABEL_LEVEL)
            .cloned()
            .collect();

        Self {
            labeled_only: true,
            facet_on: FacetSelector::None,
            timeline_mode: TimelineMode::Multi,
            locations,
            jitter_seed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn context(&self) -> SummaryContext {
        SummaryContext {
            labeled_only: self.labeled_only,
            facet_on: self.facet_on,
            locations: self.locations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.labeled_only);
        assert_eq!(config.locations.len(), 12);
        assert!(config.locations.iter().all(|l| l != "Other" && l != "No_Label"));
    }

    #[test]
    fn test_partial_file() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"facet_on": "zone", "jitter_seed": 9}"#).unwrap();
        assert_eq!(config.facet_on, FacetSelector::Zone);
        assert_eq!(config.jitter_seed, Some(9));
        assert_eq!(config.timeline_mode, TimelineMode::Multi);
        assert_eq!(config.context().locations.len(), 12);
    }
}
