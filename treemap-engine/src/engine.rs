//! FILENAME: treemap-engine/src/engine.rs
//! Treemap Engine - turns the aggregation tree into a sorted, render-ready view.
//!
//! Algorithm:
//! 1. Pick the country to show
//! 2. Derive a sort key and a sizing value for every park
//! 3. Order parks inside each market, then order the markets
//! 4. In country view, pull every park up into a single country group and
//!    order that flat list with the same key
//! 5. Stamp sibling positions and roll values back up from the leaves

use std::cmp::Ordering;

use crate::definition::{SortCriterion, TreemapRequest, ViewMode, VALUE_LABEL};
use crate::tree::{AggregateTree, TreeNode, ROOT_ID};
use crate::view::{build_legend, sort_options, SortedNode, TreemapView};
use tabular::{parse_measure, Scalar};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// SORT KEYS
// ============================================================================

/// The value a node is ordered by under one criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    /// Lowercased text.
    Text(String),
}

impl SortKey {
    fn text(s: &str) -> Self {
        SortKey::Text(s.to_lowercase())
    }

    fn number(&self) -> Option<f64> {
        match self {
            SortKey::Number(n) => Some(*n),
            SortKey::Text(_) => None,
        }
    }
}

/// Numbers descending, text ascending, numbers before text.
///
/// Text is ordered by its base letters first (`"Kraków"` sits between
/// `"Kielce"` and `"Lublin"`), then accented after unaccented.
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => y.total_cmp(x),
        (SortKey::Text(x), SortKey::Text(y)) => base_letters(x)
            .cmp(&base_letters(y))
            .then_with(|| x.cmp(y)),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    }
}

/// Lowercase text with diacritics removed. Letters that have no
/// decomposition (`ł`, `ø`, `đ`) sort after every word on their base letter.
fn base_letters(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ł' => key.extend(['l', char::MAX]),
            'ø' => key.extend(['o', char::MAX]),
            'đ' => key.extend(['d', char::MAX]),
            _ => key.push(c),
        }
    }
    key
}

/// Sort key of a park. `region` is the market the park belongs to.
pub fn leaf_sort_key(leaf: &SortedNode, criterion: &SortCriterion) -> SortKey {
    match criterion {
        SortCriterion::Value => SortKey::Number(leaf.value),
        SortCriterion::Name => SortKey::text(&leaf.label),
        SortCriterion::Region => SortKey::text(leaf.display_region().unwrap_or_default()),
        SortCriterion::Extra(column) => {
            let value = leaf.extra_data.as_ref().and_then(|extra| extra.get(column));
            match value {
                None => SortKey::Text(String::new()),
                Some(v) if v.is_blank() => SortKey::Text(String::new()),
                Some(v) => extra_key(v),
            }
        }
    }
}

fn extra_key(value: &Scalar) -> SortKey {
    match parse_measure(value) {
        Some(n) => SortKey::Number(n),
        None => SortKey::text(&value.to_text()),
    }
}

/// Rectangle size of a park: its area for alphabetical criteria, otherwise
/// the numeric key when positive, else its area.
fn leaf_sort_value(leaf: &SortedNode, key: &SortKey, criterion: &SortCriterion) -> f64 {
    if criterion.sizes_by_area() {
        return leaf.value;
    }
    match key.number() {
        Some(n) if n > 0.0 => n,
        _ => leaf.value,
    }
}

// ============================================================================
// ARRANGEMENT
// ============================================================================

/// Sorts one country's markets and parks for display.
///
/// The returned root has id `root` and the country's label. Its children are
/// the markets (regions view) or a single group holding every park (country
/// view).
pub fn arrange(country: &TreeNode, criterion: &SortCriterion, view_mode: ViewMode) -> SortedNode {
    let mut markets: Vec<SortedNode> = country
        .children
        .iter()
        .map(|market| {
            let parks = market.children.iter().map(leaf_node).collect();
            let mut node = group_node(market, sort_leaves(parks, criterion));
            node.region = market.region.clone().or_else(|| Some(market.label.clone()));
            node
        })
        .collect();
    sort_markets(&mut markets, criterion);

    let children = match view_mode {
        ViewMode::Regions => markets,
        ViewMode::Country => vec![flatten_country(country, markets, criterion)],
    };

    let mut root = SortedNode {
        id: ROOT_ID.to_string(),
        label: country.label.clone(),
        value: 0.0,
        sort_value: 0.0,
        children,
        color_value: None,
        region: None,
        original_region: None,
        extra_data: None,
        tile_index: 0,
        total_tiles: 1,
    };
    stamp_tiles(&mut root.children);
    roll_up(&mut root);
    root
}

/// Orders parks and sets their sizing values.
fn sort_leaves(parks: Vec<SortedNode>, criterion: &SortCriterion) -> Vec<SortedNode> {
    let mut keyed: Vec<(SortKey, SortedNode)> = parks
        .into_iter()
        .map(|park| (leaf_sort_key(&park, criterion), park))
        .collect();
    // Stable sort: ties keep first-encounter order.
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));

    keyed
        .into_iter()
        .map(|(key, mut park)| {
            park.sort_value = leaf_sort_value(&park, &key, criterion);
            park
        })
        .collect()
}

/// Markets follow their summed sizing value, or their name for the
/// alphabetical criteria.
fn sort_markets(markets: &mut [SortedNode], criterion: &SortCriterion) {
    if criterion.sizes_by_area() {
        markets.sort_by(|a, b| compare_keys(&SortKey::text(&a.label), &SortKey::text(&b.label)));
    } else {
        markets.sort_by(|a, b| b.sort_value.total_cmp(&a.sort_value));
    }
}

/// Collects every park into one group named after the country. Parks keep
/// their market as `original_region`.
fn flatten_country(country: &TreeNode, markets: Vec<SortedNode>, criterion: &SortCriterion) -> SortedNode {
    let parks: Vec<SortedNode> = markets
        .into_iter()
        .flat_map(|market| {
            let region = market.label;
            market.children.into_iter().map(move |mut park| {
                park.original_region = Some(region.clone());
                park.region = Some(region.clone());
                park
            })
        })
        .collect();

    group_node(country, sort_leaves(parks, criterion))
}

fn leaf_node(park: &TreeNode) -> SortedNode {
    SortedNode {
        id: park.id.clone(),
        label: park.label.clone(),
        value: park.value,
        sort_value: park.value,
        children: Vec::new(),
        color_value: park.color_value,
        region: park.region.clone(),
        original_region: None,
        extra_data: park.extra_data.clone(),
        tile_index: 0,
        total_tiles: 1,
    }
}

fn group_node(source: &TreeNode, children: Vec<SortedNode>) -> SortedNode {
    SortedNode {
        id: source.id.clone(),
        label: source.label.clone(),
        value: children.iter().map(|c| c.value).sum(),
        sort_value: children.iter().map(|c| c.sort_value).sum(),
        children,
        color_value: None,
        region: None,
        original_region: None,
        extra_data: None,
        tile_index: 0,
        total_tiles: 1,
    }
}

/// Records each node's position among its siblings, at every level.
fn stamp_tiles(siblings: &mut [SortedNode]) {
    let total = siblings.len();
    for (index, node) in siblings.iter_mut().enumerate() {
        node.tile_index = index;
        node.total_tiles = total;
        stamp_tiles(&mut node.children);
    }
}

/// Recomputes `value` and `sort_value` of every group from its children.
fn roll_up(node: &mut SortedNode) {
    if node.children.is_empty() {
        return;
    }
    node.children.iter_mut().for_each(roll_up);
    node.value = node.children.iter().map(|c| c.value).sum();
    node.sort_value = node.children.iter().map(|c| c.sort_value).sum();
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Produces the complete view for one request.
pub fn calculate_treemap(tree: &AggregateTree, request: &TreemapRequest) -> TreemapView {
    let country = select_country(tree, request.country.as_deref());

    let root = match country {
        Some(country) => arrange(country, &request.criterion, request.view_mode),
        None => SortedNode {
            id: ROOT_ID.to_string(),
            label: request.placeholder_label.clone(),
            value: 0.0,
            sort_value: 0.0,
            children: Vec::new(),
            color_value: None,
            region: None,
            original_region: None,
            extra_data: None,
            tile_index: 0,
            total_tiles: 1,
        },
    };

    let root_label = country
        .map(|c| c.label.clone())
        .unwrap_or_else(|| request.placeholder_label.clone());

    let sort_options = sort_options(tree, &request.label_overrides);
    let criterion_key = request.criterion.key();
    let sort_label = sort_options
        .iter()
        .find(|option| option.key == criterion_key)
        .map(|option| option.label.clone())
        .unwrap_or_else(|| VALUE_LABEL.to_string());

    TreemapView {
        legend: build_legend(&root, request.view_mode),
        total_value: root.value,
        root,
        root_label,
        criterion: request.criterion.clone(),
        view_mode: request.view_mode,
        sort_label,
        sort_options,
    }
}

/// The requested country when present in the tree, else the first one.
pub fn select_country<'a>(tree: &'a AggregateTree, preferred: Option<&str>) -> Option<&'a TreeNode> {
    preferred
        .and_then(|label| tree.root.find_child(label))
        .or_else(|| tree.countries().first())
}
