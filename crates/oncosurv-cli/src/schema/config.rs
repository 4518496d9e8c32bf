use oncosurv_analysis::{cohort::CohortConfig, stage::ComparisonConfig};
use serde::{Deserialize, Serialize};

use crate::render::style::PlotStyle;

/// Analysis settings read from the `--config` JSON file.
///
/// Every section and field has a default, so a partial file only overrides
/// what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cleaning of the raw records into a cohort
    pub cohort: CohortConfig,
    /// Selection and comparison of tumor stage groups
    pub comparison: ComparisonConfig,
    /// Appearance of the rendered charts
    pub plot: PlotStyle,
}

#[cfg(test)]
mod tests {
    use oncosurv_analysis::patch::PatchAction;

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "cohort": {
                    "patches": [
                        {"case_id": "abc", "field": "days_to_death", "action": {"set": 0.0}}
                    ]
                },
                "comparison": {"min_group_size": 30},
                "plot": {"width": 800}
            }"#,
        )
        .unwrap();

        assert_eq!(config.cohort.patches.len(), 1);
        assert_eq!(config.cohort.patches[0].action, PatchAction::Set(0.0));
        assert_eq!(config.cohort.sparse_column_threshold, 0.9);
        assert_eq!(config.comparison.min_group_size, 30);
        assert_eq!(config.comparison.stage_order.rank("stage iv"), Some(4));
        assert_eq!(config.plot.width, 800);
        assert_eq!(config.plot.height, PlotStyle::default().height);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config: AnalysisConfig =
            serde_json::from_str(include_str!("../../../../config/analysis.example.json")).unwrap();
        assert_eq!(config.cohort.patches.len(), 2);
        assert_eq!(config.cohort.patches[1].action, PatchAction::Absolute);
        assert_eq!(config.comparison, ComparisonConfig::default());
    }
}
