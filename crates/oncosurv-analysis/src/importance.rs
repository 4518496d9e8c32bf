//! Externally computed feature importances
//!
//! Importances come from a survival model trained elsewhere (for instance a
//! random survival forest scored by permutation importance). This module only
//! validates and ranks them for display.
//!
//! # Example
//!
//! ```
//! use oncosurv_analysis::importance::FeatureImportances;
//!
//! let json = r#"{
//!     "features": ["age_at_index", "tumor_stage", "gender"],
//!     "importances": [0.012, 0.031, 0.0004],
//!     "concordance_index": 0.6843
//! }"#;
//! let importances: FeatureImportances = serde_json::from_str(json).unwrap();
//!
//! let ranked = importances.ranked().unwrap();
//! assert_eq!(ranked[0], ("tumor_stage", 0.031));
//! assert!(importances.title().ends_with("(Permutation Importance). ci=0.684"));
//! ```

use serde::{Deserialize, Serialize};

/// Importance below which a feature is considered uninformative.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportances {
    pub features: Vec<String>,
    pub importances: Vec<f64>,
    /// Display order as indices into `features`; descending importance when
    /// absent.
    #[serde(default)]
    pub order: Option<Vec<usize>>,
    pub concordance_index: f64,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ImportanceError {
    #[display("{features} feature names but {importances} importance values")]
    LengthMismatch { features: usize, importances: usize },
    #[display("Order index {index} is out of range for {len} features")]
    IndexOutOfRange { index: usize, len: usize },
}

impl FeatureImportances {
    /// `(feature, importance)` in display order.
    pub fn ranked(&self) -> Result<Vec<(&str, f64)>, ImportanceError> {
        let len = self.features.len();
        if self.importances.len() != len {
            return Err(ImportanceError::LengthMismatch {
                features: len,
                importances: self.importances.len(),
            });
        }

        let order = match &self.order {
            Some(order) => {
                if let Some(&index) = order.iter().find(|&&index| index >= len) {
                    return Err(ImportanceError::IndexOutOfRange { index, len });
                }
                order.clone()
            }
            None => {
                let mut order = (0..len).collect::<Vec<_>>();
                order.sort_by(|&a, &b| self.importances[b].total_cmp(&self.importances[a]));
                order
            }
        };

        Ok(order
            .into_iter()
            .map(|idx| (self.features[idx].as_str(), self.importances[idx]))
            .collect())
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Feature Importances from Random Survival Forest (Permutation Importance). ci={:.3}",
            self.concordance_index
        )
    }
}
