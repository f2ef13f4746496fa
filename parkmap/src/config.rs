//! FILENAME: parkmap/src/config.rs
//! PURPOSE: Session defaults, loadable from JSON.

use crate::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use treemap_engine::{SortCriterion, TreemapRequest, ViewMode, DEFAULT_ROOT_LABEL};

/// Starting state for a session. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub default_sort: SortCriterion,
    pub default_view: ViewMode,

    /// Root label shown before any country is known.
    pub placeholder_label: String,

    /// Country shown first when the data has several.
    pub preferred_country: Option<String>,

    /// Column name -> sort option label.
    pub sort_labels: BTreeMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_sort: SortCriterion::Value,
            default_view: ViewMode::Regions,
            placeholder_label: DEFAULT_ROOT_LABEL.to_string(),
            preferred_country: None,
            sort_labels: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let json = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Request for the given state, carrying this config's labels.
    pub(crate) fn request(
        &self,
        criterion: &SortCriterion,
        view_mode: ViewMode,
        country: Option<&str>,
    ) -> TreemapRequest {
        TreemapRequest {
            criterion: criterion.clone(),
            view_mode,
            country: country.map(str::to_string),
            placeholder_label: self.placeholder_label.clone(),
            label_overrides: self
                .sort_labels
                .iter()
                .map(|(column, label)| (column.clone(), label.clone()))
                .collect(),
        }
    }
}
