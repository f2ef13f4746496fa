//! FILENAME: treemap-engine/src/definition.rs
//! Treemap Definition - what the user asked to see.
//!
//! These types describe the active sort criterion and view mode. They are
//! plain values, serializable for the rendering bridge, and never hold data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that turns an original column name into a sort key.
pub const EXTRA_PREFIX: &str = "extra_";

pub const VALUE_LABEL: &str = "By Area (m²)";
pub const NAME_LABEL: &str = "Alphabetically (A-Z)";
pub const REGION_LABEL: &str = "By Region";

/// Friendly labels for columns that commonly appear in park sheets.
const COLUMN_LABELS: [(&str, &str); 6] = [
    ("BUILDING AREA", "Building Area"),
    ("CAP VALUE/AREA", "Cap Value/Area"),
    ("VAULT", "Vault"),
    ("OCCUPANCY %", "Occupancy %"),
    ("# OF VIEWINGS 2025", "# of Viewings 2025"),
    ("# OF OPPS IN 2025", "# of Opps in 2025"),
];

// ============================================================================
// SORT CRITERION
// ============================================================================

/// How siblings are ordered and, for numeric criteria, how tiles are sized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortCriterion {
    /// Area, largest first.
    #[default]
    Value,
    /// Label, A-Z.
    Name,
    /// Market name, A-Z.
    Region,
    /// An original column: numbers largest first, text A-Z.
    Extra(String),
}

impl SortCriterion {
    pub fn key(&self) -> String {
        match self {
            SortCriterion::Value => "value".to_string(),
            SortCriterion::Name => "name".to_string(),
            SortCriterion::Region => "region".to_string(),
            SortCriterion::Extra(column) => format!("{}{}", EXTRA_PREFIX, column),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "value" => Some(SortCriterion::Value),
            "name" => Some(SortCriterion::Name),
            "region" => Some(SortCriterion::Region),
            _ => key
                .strip_prefix(EXTRA_PREFIX)
                .filter(|column| !column.is_empty())
                .map(|column| SortCriterion::Extra(column.to_string())),
        }
    }

    /// Alphabetical criteria keep the tile size at the park's area.
    pub fn sizes_by_area(&self) -> bool {
        matches!(self, SortCriterion::Name | SortCriterion::Region)
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl TryFrom<String> for SortCriterion {
    type Error = String;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        SortCriterion::parse(&key).ok_or_else(|| format!("unknown sort criterion: {}", key))
    }
}

impl From<SortCriterion> for String {
    fn from(criterion: SortCriterion) -> Self {
        criterion.key()
    }
}

// ============================================================================
// VIEW MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Market groups containing their parks.
    #[default]
    Regions,
    /// Every park directly under one country group.
    Country,
}

// ============================================================================
// SORT OPTIONS
// ============================================================================

/// One entry of the sort selector offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOption {
    pub key: String,
    pub label: String,
}

impl SortOption {
    pub fn new(criterion: &SortCriterion, label: impl Into<String>) -> Self {
        SortOption {
            key: criterion.key(),
            label: label.into(),
        }
    }
}

/// The options that are always available, in display order.
pub fn base_sort_options() -> Vec<SortOption> {
    vec![
        SortOption::new(&SortCriterion::Value, VALUE_LABEL),
        SortOption::new(&SortCriterion::Name, NAME_LABEL),
        SortOption::new(&SortCriterion::Region, REGION_LABEL),
    ]
}

/// Label for an extra column: caller overrides first, then the built-in
/// table, then the trimmed header itself.
pub fn column_label(header: &str, overrides: &[(String, String)]) -> String {
    let clean = header.trim();
    overrides
        .iter()
        .find(|(column, _)| column == clean)
        .map(|(_, label)| label.clone())
        .or_else(|| {
            COLUMN_LABELS
                .iter()
                .find(|(column, _)| *column == clean)
                .map(|(_, label)| label.to_string())
        })
        .unwrap_or_else(|| clean.to_string())
}

// ============================================================================
// REQUEST
// ============================================================================

/// Everything the engine needs besides the aggregated tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapRequest {
    pub criterion: SortCriterion,
    pub view_mode: ViewMode,
    /// Country to render. Falls back to the first country in the tree.
    pub country: Option<String>,
    /// Root label when no country is available.
    pub placeholder_label: String,
    pub label_overrides: Vec<(String, String)>,
}

impl TreemapRequest {
    pub fn new(criterion: SortCriterion, view_mode: ViewMode) -> Self {
        TreemapRequest {
            criterion,
            view_mode,
            country: None,
            placeholder_label: crate::DEFAULT_ROOT_LABEL.to_string(),
            label_overrides: Vec::new(),
        }
    }
}

impl Default for TreemapRequest {
    fn default() -> Self {
        TreemapRequest::new(SortCriterion::Value, ViewMode::Regions)
    }
}
