//! FILENAME: treemap-engine/src/tree.rs
//! Aggregation Tree - the canonical country -> market -> park hierarchy.
//!
//! Rows are validated, grouped in first-encounter order and rolled up so
//! every internal node's value is the sum of its children. The tree is a
//! pure derivation of the table; it is rebuilt from scratch on every change.

use rustc_hash::FxHashMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tabular::{
    parse_grouped_number, parse_occupancy, ColumnRole, ResolvedColumns, RoleMapping, Scalar,
    Table,
};
use thiserror::Error;

pub const ROOT_ID: &str = "root";
pub const ROOT_LABEL: &str = "Root";

/// Joins ancestor labels into a node id ("root/Poland/Warsaw/Park A").
pub const ID_DELIMITER: char = '/';

/// Escapes the delimiter (and the escape itself) inside label segments.
const ID_ESCAPE: char = '\\';

/// Group label that marks a spreadsheet subtotal row.
const TOTAL_LABEL: &str = "total";

// ============================================================================
// EXTRA DATA
// ============================================================================

/// Original columns not consumed by a role, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraData {
    entries: Vec<(String, Scalar)>,
}

impl ExtraData {
    pub fn new() -> Self {
        ExtraData::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Scalar) {
        self.entries.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// A present value that is not blank text.
    pub fn non_blank(&self, column: &str) -> Option<&Scalar> {
        self.get(column).filter(|v| !v.is_blank())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtraData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// SKIPPED ROWS
// ============================================================================

/// Why a row was left out of the tree. Checked in this order; the first
/// failing check is the one counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoCountry,
    NoMarket,
    NoPark,
    InvalidArea,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub no_country: usize,
    pub no_market: usize,
    pub no_park: usize,
    pub invalid_area: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        *self.slot(reason) += 1;
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::NoCountry => self.no_country,
            SkipReason::NoMarket => self.no_market,
            SkipReason::NoPark => self.no_park,
            SkipReason::InvalidArea => self.invalid_area,
        }
    }

    pub fn total(&self) -> usize {
        self.no_country + self.no_market + self.no_park + self.invalid_area
    }

    fn slot(&mut self, reason: SkipReason) -> &mut usize {
        match reason {
            SkipReason::NoCountry => &mut self.no_country,
            SkipReason::NoMarket => &mut self.no_market,
            SkipReason::NoPark => &mut self.no_park,
            SkipReason::InvalidArea => &mut self.invalid_area,
        }
    }
}

// ============================================================================
// TREE NODES
// ============================================================================

/// A node of the aggregation tree. Leaves are parks; they alone carry
/// `color_value` and `extra_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,

    /// Area for a leaf, sum of children otherwise.
    pub value: f64,

    pub label: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,

    /// Occupancy as a fraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_value: Option<f64>,

    /// Owning market label, set on markets and parks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
}

impl TreeNode {
    fn group(id: String, label: String, children: Vec<TreeNode>) -> Self {
        TreeNode {
            id,
            value: children.iter().map(|c| c.value).sum(),
            label,
            children,
            color_value: None,
            region: None,
            extra_data: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first iterator over the leaves below (or at) this node.
    pub fn leaves(&self) -> Box<dyn Iterator<Item = &TreeNode> + '_> {
        if self.is_leaf() {
            Box::new(std::iter::once(self))
        } else {
            Box::new(self.children.iter().flat_map(|c| c.leaves()))
        }
    }

    pub fn find_child(&self, label: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.label == label)
    }
}

/// The built tree plus the bookkeeping gathered while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateTree {
    /// Root -> countries -> markets -> parks.
    pub root: TreeNode,
    pub skipped: SkipCounts,
    pub rows_used: usize,
    /// Headers of the source table, used to derive sort options.
    pub headers: Vec<String>,
}

impl AggregateTree {
    pub fn countries(&self) -> &[TreeNode] {
        &self.root.children
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaves().count()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("required columns not found: {}", role_names(.missing))]
    MissingColumns {
        /// Every header that was present, for the diagnostic.
        headers: Vec<String>,
        missing: Vec<ColumnRole>,
    },

    #[error("no valid rows ({} skipped)", .skipped.total())]
    NoValidRows { skipped: SkipCounts },
}

fn role_names(roles: &[ColumnRole]) -> String {
    roles.iter().map(|r| r.name()).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the tree, resolving column roles from the table's headers.
pub fn build_tree(table: &Table) -> Result<AggregateTree, BuildError> {
    let roles = RoleMapping::resolve(table.headers());
    build_tree_with(table, &roles)
}

/// Builds the tree with an already-resolved role mapping.
pub fn build_tree_with(table: &Table, roles: &RoleMapping) -> Result<AggregateTree, BuildError> {
    let columns = roles
        .resolved()
        .map_err(|missing| BuildError::MissingColumns {
            headers: table.headers().to_vec(),
            missing,
        })?;

    let mut countries: Grouped<Grouped<Grouped<ParkEntry>>> = Grouped::default();
    let mut skipped = SkipCounts::default();
    let mut rows_used = 0;

    for record in table.records() {
        let cells = record.cells();
        let row = match validate_row(cells, &columns) {
            Ok(row) => row,
            Err(reason) => {
                skipped.record(reason);
                continue;
            }
        };

        let park = ParkEntry {
            area: row.area,
            occupancy: columns
                .occupancy
                .and_then(|c| cells.get(c))
                .and_then(parse_occupancy),
            extra: extra_data(table.headers(), cells, &columns),
        };

        countries
            .entry(row.country)
            .entry(row.market)
            .insert(row.park, park);
        rows_used += 1;
    }

    if rows_used == 0 {
        return Err(BuildError::NoValidRows { skipped });
    }

    let children = countries
        .into_items()
        .map(|(country, markets)| country_node(country, markets))
        .collect();

    Ok(AggregateTree {
        root: TreeNode::group(ROOT_ID.to_string(), ROOT_LABEL.to_string(), children),
        skipped,
        rows_used,
        headers: table.headers().to_vec(),
    })
}

struct ValidRow {
    country: String,
    market: String,
    park: String,
    area: f64,
}

fn validate_row(cells: &[Scalar], columns: &ResolvedColumns) -> Result<ValidRow, SkipReason> {
    let country = group_label(cells, columns.country).ok_or(SkipReason::NoCountry)?;
    let market = group_label(cells, columns.market).ok_or(SkipReason::NoMarket)?;
    let park = group_label(cells, columns.park).ok_or(SkipReason::NoPark)?;
    let area = cells
        .get(columns.area)
        .and_then(parse_grouped_number)
        .filter(|a| *a > 0.0)
        .ok_or(SkipReason::InvalidArea)?;

    Ok(ValidRow {
        country,
        market,
        park,
        area,
    })
}

/// A usable group label: non-blank and not a subtotal marker.
fn group_label(cells: &[Scalar], column: usize) -> Option<String> {
    let label = cells.get(column)?.trimmed();
    if label.is_empty() || label.eq_ignore_ascii_case(TOTAL_LABEL) {
        None
    } else {
        Some(label)
    }
}

fn extra_data(headers: &[String], cells: &[Scalar], columns: &ResolvedColumns) -> ExtraData {
    let mut extra = ExtraData::new();
    for (idx, (header, cell)) in headers.iter().zip(cells).enumerate() {
        if !columns.is_consumed(idx) {
            extra.push(header.clone(), cell.clone());
        }
    }
    extra
}

struct ParkEntry {
    area: f64,
    occupancy: Option<f64>,
    extra: ExtraData,
}

/// Appends one escaped label segment to a parent id. Every id below the
/// root therefore contains an unescaped delimiter and cannot equal `ROOT_ID`.
pub fn child_id(parent: &str, label: &str) -> String {
    let mut id = String::with_capacity(parent.len() + label.len() + 1);
    id.push_str(parent);
    id.push(ID_DELIMITER);
    for c in label.chars() {
        if c == ID_DELIMITER || c == ID_ESCAPE {
            id.push(ID_ESCAPE);
        }
        id.push(c);
    }
    id
}

fn country_node(country: String, markets: Grouped<Grouped<ParkEntry>>) -> TreeNode {
    let country_id = child_id(ROOT_ID, &country);
    let children = markets
        .into_items()
        .map(|(market, parks)| market_node(&country_id, market, parks))
        .collect();
    TreeNode::group(country_id, country, children)
}

fn market_node(country_id: &str, market: String, parks: Grouped<ParkEntry>) -> TreeNode {
    let market_id = child_id(country_id, &market);
    let children = parks
        .into_items()
        .map(|(park, entry)| TreeNode {
            id: child_id(&market_id, &park),
            value: entry.area,
            label: park,
            children: Vec::new(),
            color_value: entry.occupancy,
            region: Some(market.clone()),
            extra_data: Some(entry.extra),
        })
        .collect();

    let mut node = TreeNode::group(market_id, market.clone(), children);
    node.region = Some(market);
    node
}

// ============================================================================
// INSERTION-ORDERED GROUPING
// ============================================================================

/// Keyed collection that iterates in first-insertion order. Re-inserting a
/// key replaces the value but keeps its position.
struct Grouped<T> {
    index: FxHashMap<String, usize>,
    items: Vec<(String, T)>,
}

impl<T> Default for Grouped<T> {
    fn default() -> Self {
        Grouped {
            index: FxHashMap::default(),
            items: Vec::new(),
        }
    }
}

impl<T> Grouped<T> {
    fn insert(&mut self, key: String, value: T) {
        match self.index.get(&key) {
            Some(&pos) => self.items[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.items.push((key, value));
            }
        }
    }

    fn into_items(self) -> impl Iterator<Item = (String, T)> {
        self.items.into_iter()
    }
}

impl<T: Default> Grouped<T> {
    fn entry(&mut self, key: String) -> &mut T {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.items.len();
                self.index.insert(key.clone(), pos);
                self.items.push((key, T::default()));
                pos
            }
        };
        &mut self.items[pos].1
    }
}
