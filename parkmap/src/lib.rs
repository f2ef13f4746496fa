//! FILENAME: parkmap/src/lib.rs
//! PURPOSE: Pipeline entry point: spreadsheet in, park treemap out.
//! CONTEXT: A `Session` owns the loaded table and derives everything else
//! from it on demand. The presentation layer feeds it files, cell edits and
//! sort/view choices, and renders whatever `Session::snapshot` returns.

pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::SessionConfig;
pub use decode::{read_source, DecodeCompletion, DecodeTicket, SourceBytes};
pub use error::{ErrorClass, LastError, PipelineError};
pub use pipeline::{Diagnostic, DiagnosticKind, Session, Snapshot, SourceInfo};

// Re-exported so hosts only need this crate.
pub use persistence::{LoadError, LoadReport, SourceKind};
pub use tabular::{ColumnRole, Scalar, Table};
pub use treemap_engine::{
    format_number, format_occupancy, tile_caption, LegendEntry, SortCriterion, SortOption,
    SortedNode, TreemapView, ViewMode,
};
