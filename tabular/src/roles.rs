//! FILENAME: tabular/src/roles.rs
//! PURPOSE: Maps semantic column roles onto the headers actually present.
//! CONTEXT: Uploaded sheets name their columns freely ("Prologis Market",
//! "Park/Bucket", "BUILDING AREA", ...). An ordered rule table is evaluated
//! once per header list and the resulting `RoleMapping` is shared by the
//! forward-fill pass and the tree builder.

use serde::{Deserialize, Serialize};

/// A semantic meaning that one raw column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Country,
    Market,
    Park,
    Area,
    Occupancy,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Country,
        ColumnRole::Market,
        ColumnRole::Park,
        ColumnRole::Area,
        ColumnRole::Occupancy,
    ];

    /// Roles without which no tree can be built.
    pub const REQUIRED: [ColumnRole; 4] = [
        ColumnRole::Country,
        ColumnRole::Market,
        ColumnRole::Park,
        ColumnRole::Area,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColumnRole::Country => "country",
            ColumnRole::Market => "market",
            ColumnRole::Park => "park",
            ColumnRole::Area => "area",
            ColumnRole::Occupancy => "occupancy",
        }
    }

    pub fn is_required(self) -> bool {
        self != ColumnRole::Occupancy
    }

    /// Tests a raw header against this role's rule (case-insensitive).
    pub fn matches(self, header: &str) -> bool {
        (self.rule())(header.to_lowercase().as_str())
    }

    /// True for the three grouping roles (country, market, park).
    pub fn is_hierarchy(self) -> bool {
        matches!(
            self,
            ColumnRole::Country | ColumnRole::Market | ColumnRole::Park
        )
    }

    fn rule(self) -> HeaderRule {
        ROLE_RULES[self.slot()].1
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// Predicate over an already-lowercased header.
type HeaderRule = fn(&str) -> bool;

fn is_country(h: &str) -> bool {
    h.contains("country")
}

fn is_market(h: &str) -> bool {
    h.contains("market") || h.contains("prologis")
}

fn is_park(h: &str) -> bool {
    h.contains("park") || h.contains("bucket")
}

fn is_area(h: &str) -> bool {
    h.contains("building") && h.contains("area")
}

fn is_occupancy(h: &str) -> bool {
    h.contains("occupancy")
}

/// Indexed by `ColumnRole as usize`. For each role the first header (in
/// header order) that satisfies the rule claims it.
const ROLE_RULES: [(ColumnRole, HeaderRule); 5] = [
    (ColumnRole::Country, is_country),
    (ColumnRole::Market, is_market),
    (ColumnRole::Park, is_park),
    (ColumnRole::Area, is_area),
    (ColumnRole::Occupancy, is_occupancy),
];

// ============================================================================
// MAPPING
// ============================================================================

/// Resolved role -> column index pointers for one header list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleMapping {
    slots: [Option<usize>; 5],
}

/// The mapping once every required role is known to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub country: usize,
    pub market: usize,
    pub park: usize,
    pub area: usize,
    pub occupancy: Option<usize>,
}

impl ResolvedColumns {
    /// True if the column is read by one of the roles, which keeps it out of
    /// a leaf's extra data.
    pub fn is_consumed(&self, column: usize) -> bool {
        column == self.country
            || column == self.market
            || column == self.park
            || column == self.area
            || self.occupancy == Some(column)
    }
}

impl RoleMapping {
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let lowered: Vec<String> = headers.iter().map(|h| h.as_ref().to_lowercase()).collect();
        let mut slots = [None; 5];
        for (role, rule) in ROLE_RULES {
            slots[role.slot()] = lowered.iter().position(|h| rule(h.as_str()));
        }
        RoleMapping { slots }
    }

    pub fn column(&self, role: ColumnRole) -> Option<usize> {
        self.slots[role.slot()]
    }

    /// The header string a role resolved to, if any.
    pub fn header<'a, S: AsRef<str>>(&self, role: ColumnRole, headers: &'a [S]) -> Option<&'a str> {
        self.column(role)
            .and_then(|c| headers.get(c))
            .map(|h| h.as_ref())
    }

    pub fn missing_required(&self) -> Vec<ColumnRole> {
        ColumnRole::REQUIRED
            .into_iter()
            .filter(|role| self.column(*role).is_none())
            .collect()
    }

    /// Returns the resolved columns, or the list of required roles that
    /// could not be matched.
    pub fn resolved(&self) -> Result<ResolvedColumns, Vec<ColumnRole>> {
        match (
            self.column(ColumnRole::Country),
            self.column(ColumnRole::Market),
            self.column(ColumnRole::Park),
            self.column(ColumnRole::Area),
        ) {
            (Some(country), Some(market), Some(park), Some(area)) => Ok(ResolvedColumns {
                country,
                market,
                park,
                area,
                occupancy: self.column(ColumnRole::Occupancy),
            }),
            _ => Err(self.missing_required()),
        }
    }
}
