//! FILENAME: treemap-engine/src/lib.rs
//! Park treemap subsystem.
//!
//! Builds the country -> market -> park aggregation tree from a reconciled
//! `tabular::Table` and arranges it for a nested-rectangle renderer.
//!
//! Layers:
//! - `definition`: What the user asked for (sort criterion, view mode)
//! - `tree`: The canonical aggregation tree (WHAT the data is)
//! - `engine`: Sorting, flattening and sizing (HOW we arrange it)
//! - `view`: Renderable output for the frontend (WHAT we display)
//! - `palette` / `format`: Colors and captions for tiles

pub mod definition;
pub mod engine;
pub mod format;
pub mod palette;
pub mod tree;
pub mod view;

pub use definition::*;
pub use engine::{arrange, calculate_treemap, compare_keys, leaf_sort_key, select_country, SortKey};
pub use format::{format_number, format_occupancy, format_scalar, tile_caption};
pub use palette::{region_color, tile_shade, Rgb, FALLBACK_COLOR};
pub use tree::{
    build_tree, build_tree_with, AggregateTree, BuildError, ExtraData, SkipCounts, SkipReason,
    child_id, TreeNode, ID_DELIMITER, ROOT_ID,
};
pub use view::{build_legend, sort_options, LegendEntry, SortedNode, TreemapView};

/// Root label used when no country can be shown.
pub const DEFAULT_ROOT_LABEL: &str = "Poland";
