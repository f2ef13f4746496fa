//! FILENAME: tabular/src/lib.rs
//! PURPOSE: Main library entry point for the tabular data model.
//! CONTEXT: Every uploaded document is normalized into a `Table`. This crate
//! also owns the column-role rules and the forward-fill pass, since both
//! only need the table itself.

pub mod numeric;
pub mod reconcile;
pub mod roles;
pub mod scalar;
pub mod table;

// Re-export commonly used types at the crate root
pub use numeric::{parse_grouped_number, parse_measure, parse_occupancy};
pub use reconcile::{forward_fill, forward_fill_with, FillSummary};
pub use roles::{ColumnRole, ResolvedColumns, RoleMapping};
pub use scalar::Scalar;
pub use table::{EditError, Record, Table};
