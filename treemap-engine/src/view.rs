//! FILENAME: treemap-engine/src/view.rs
//! Treemap View - the render-ready output handed to the presentation layer.
//!
//! Everything here is produced by the engine and only read by callers.

use crate::definition::{base_sort_options, column_label, SortCriterion, SortOption, ViewMode};
use crate::palette::{region_color, tile_shade, Rgb};
use crate::tree::{AggregateTree, ExtraData};
use serde::Serialize;
use tabular::ColumnRole;

// ============================================================================
// SORTED NODES
// ============================================================================

/// A tree node after sorting, with its sizing value and sibling position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedNode {
    pub id: String,
    pub label: String,

    /// Area, rolled up from the children for groups.
    pub value: f64,

    /// Rectangle size under the active criterion.
    pub sort_value: f64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SortedNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Market a leaf came from once the country view dropped that level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,

    pub tile_index: usize,
    pub total_tiles: usize,
}

impl SortedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Region used for coloring: the original market if known.
    pub fn display_region(&self) -> Option<&str> {
        self.original_region
            .as_deref()
            .or(self.region.as_deref())
    }

    /// Base color of the tile's region.
    pub fn base_color(&self) -> Rgb {
        region_color(self.display_region().unwrap_or_default())
    }

    /// Shaded fill for this tile among its siblings.
    pub fn tile_color(&self) -> Rgb {
        tile_shade(self.base_color(), self.tile_index, self.total_tiles)
    }

    pub fn leaves(&self) -> Box<dyn Iterator<Item = &SortedNode> + '_> {
        if self.is_leaf() {
            Box::new(std::iter::once(self))
        } else {
            Box::new(self.children.iter().flat_map(|c| c.leaves()))
        }
    }
}

// ============================================================================
// LEGEND
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub region_name: String,
    pub color: Rgb,
}

impl LegendEntry {
    pub fn new(region_name: impl Into<String>) -> Self {
        let region_name = region_name.into();
        let color = region_color(&region_name);
        LegendEntry { region_name, color }
    }
}

/// Regions view lists the top-level groups. Country view lists each leaf's
/// original market once, in first-seen order, leaving out the country itself.
pub fn build_legend(root: &SortedNode, view_mode: ViewMode) -> Vec<LegendEntry> {
    match view_mode {
        ViewMode::Regions => root
            .children
            .iter()
            .map(|group| LegendEntry::new(group.label.as_str()))
            .collect(),
        ViewMode::Country => {
            let mut seen: Vec<&str> = Vec::new();
            for leaf in root.children.iter().flat_map(|c| c.children.iter()) {
                let region = leaf.display_region().unwrap_or_default();
                if !region.is_empty() && region != root.label && !seen.contains(&region) {
                    seen.push(region);
                }
            }
            seen.into_iter().map(LegendEntry::new).collect()
        }
    }
}

// ============================================================================
// SORT OPTIONS
// ============================================================================

/// The criteria the user may pick: the three base options, then one per
/// original column that has a value on at least one leaf. Country, market
/// and park columns are never offered.
pub fn sort_options(tree: &AggregateTree, overrides: &[(String, String)]) -> Vec<SortOption> {
    let mut options = base_sort_options();

    for header in &tree.headers {
        if ColumnRole::ALL
            .iter()
            .any(|role| role.is_hierarchy() && role.matches(header))
        {
            continue;
        }
        let populated = tree.root.leaves().any(|leaf| {
            leaf.extra_data
                .as_ref()
                .is_some_and(|extra| extra.non_blank(header).is_some())
        });
        if populated {
            let criterion = SortCriterion::Extra(header.clone());
            options.push(SortOption::new(&criterion, column_label(header, overrides)));
        }
    }

    options
}

// ============================================================================
// VIEW
// ============================================================================

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreemapView {
    /// Root whose children are markets (regions view) or the single country
    /// group (country view).
    pub root: SortedNode,

    /// Country being shown, or the placeholder.
    pub root_label: String,

    pub total_value: f64,

    pub criterion: SortCriterion,
    pub view_mode: ViewMode,

    /// Label of the active criterion.
    pub sort_label: String,

    pub sort_options: Vec<SortOption>,
    pub legend: Vec<LegendEntry>,
}

impl TreemapView {
    /// Number of rendered tiles.
    pub fn tile_count(&self) -> usize {
        if self.root.is_leaf() {
            return 0;
        }
        self.root.leaves().count()
    }

    pub fn find(&self, id: &str) -> Option<&SortedNode> {
        fn walk<'a>(node: &'a SortedNode, id: &str) -> Option<&'a SortedNode> {
            if node.id == id {
                return Some(node);
            }
            node.children.iter().find_map(|c| walk(c, id))
        }
        walk(&self.root, id)
    }
}
