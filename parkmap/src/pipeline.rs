//! FILENAME: parkmap/src/pipeline.rs
//! PURPOSE: The session that owns the table and serves render snapshots.
//! CONTEXT: Loads run decode -> normalize -> forward fill and replace the
//! table only on success. Edits and configuration changes never patch derived
//! state; `snapshot` rebuilds the tree and view from scratch when any input
//! changed, keyed by the table's content hash and the active settings.

use crate::config::SessionConfig;
use crate::decode::{DecodeCompletion, DecodeTicket};
use crate::error::{LastError, PipelineError};
use crate::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};
use persistence::{LoadReport, SourceKind};
use serde::Serialize;
use std::path::Path;
use tabular::{forward_fill, ColumnRole, FillSummary, Scalar, Table};
use treemap_engine::{
    build_tree, calculate_treemap, AggregateTree, BuildError, SkipCounts, SortCriterion,
    TreemapView, ViewMode,
};

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    MissingColumns,
    NoValidRows,
}

/// Why no treemap can be drawn for the current table. The table itself stays
/// available for editing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Headers that were found.
    pub headers: Vec<String>,
    /// Required roles no header matched.
    pub missing: Vec<ColumnRole>,
    pub skipped: SkipCounts,
    pub message: String,
}

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Snapshot {
    /// Nothing loaded yet.
    Empty,
    Ready {
        view: Box<TreemapView>,
        skipped: SkipCounts,
    },
    Diagnostic(Diagnostic),
}

impl Snapshot {
    pub fn view(&self) -> Option<&TreemapView> {
        match self {
            Snapshot::Ready { view, .. } => Some(view.as_ref()),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Snapshot::Diagnostic(d) => Some(d),
            _ => None,
        }
    }
}

// ============================================================================
// SOURCE INFO
// ============================================================================

/// Where the current table came from and what loading it changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub kind: SourceKind,
    pub report: LoadReport,
    pub country_filled: usize,
    pub market_filled: usize,
}

impl SourceInfo {
    fn new(name: &str, kind: SourceKind, report: LoadReport, fill: FillSummary) -> Self {
        SourceInfo {
            name: name.to_string(),
            kind,
            report,
            country_filled: fill.country_filled,
            market_filled: fill.market_filled,
        }
    }
}

// ============================================================================
// MEMO
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct ViewKey {
    table_hash: u64,
    criterion: SortCriterion,
    view_mode: ViewMode,
    country: Option<String>,
}

struct TreeMemo {
    table_hash: u64,
    tree: Result<AggregateTree, BuildError>,
}

struct ViewMemo {
    key: ViewKey,
    snapshot: Snapshot,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    config: SessionConfig,
    table: Option<Table>,
    source: Option<SourceInfo>,
    criterion: SortCriterion,
    view_mode: ViewMode,
    country: Option<String>,
    last_error: Option<LastError>,
    decode_seq: u64,
    tree_memo: Option<TreeMemo>,
    view_memo: Option<ViewMemo>,
    empty: Snapshot,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            criterion: config.default_sort.clone(),
            view_mode: config.default_view,
            country: config.preferred_country.clone(),
            config,
            table: None,
            source: None,
            last_error: None,
            decode_seq: 0,
            tree_memo: None,
            view_memo: None,
            empty: Snapshot::Empty,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    pub fn criterion(&self) -> &SortCriterion {
        &self.criterion
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The most recent failure, cleared by the next successful load.
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Loads an in-memory document. On failure the current table is kept.
    /// Any read still in flight becomes stale.
    pub fn load_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
        kind: SourceKind,
    ) -> Result<&SourceInfo, PipelineError> {
        self.supersede_reads();
        self.apply_bytes(name, bytes, kind)
    }

    fn apply_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
        kind: SourceKind,
    ) -> Result<&SourceInfo, PipelineError> {
        log_enter!("LOAD", "load_bytes", "name={} kind={:?} bytes={}", name, kind, bytes.len());

        let loaded = match persistence::load_bytes(bytes, kind) {
            Ok(loaded) => loaded,
            Err(e) => return Err(self.fail(e.into())),
        };

        let report = loaded.report;
        if report.dropped_cells > 0 {
            log_warn!(
                "LOAD",
                "{} cells in {} columns beyond the header row were dropped",
                report.dropped_cells,
                report.dropped_columns
            );
        }

        let (table, fill) = forward_fill(&loaded.table);
        log_info!(
            "LOAD",
            "{}: {} rows x {} columns, {} blank rows skipped, filled country={} market={}",
            name,
            table.len(),
            table.width(),
            report.blank_rows,
            fill.country_filled,
            fill.market_filled
        );

        self.table = Some(table);
        self.country = self.config.preferred_country.clone();
        self.last_error = None;
        self.invalidate();
        log_exit!("LOAD", "load_bytes");

        Ok(&*self.source.insert(SourceInfo::new(name, kind, report, fill)))
    }

    /// Reads and loads a file synchronously.
    pub fn load_path(&mut self, path: &Path) -> Result<&SourceInfo, PipelineError> {
        self.supersede_reads();
        let kind = match SourceKind::from_path(path) {
            Some(kind) => kind,
            None => {
                let err = persistence::LoadError::UnsupportedFormat(path.display().to_string());
                return Err(self.fail(err.into()));
            }
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(persistence::LoadError::from(e).into())),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.apply_bytes(&name, &bytes, kind)
    }

    /// Starts a new read. Any read started earlier becomes stale.
    pub fn begin_decode(&mut self) -> DecodeTicket {
        self.supersede_reads();
        log_debug!("DECODE", "begin {}", self.decode_seq);
        DecodeTicket(self.decode_seq)
    }

    fn supersede_reads(&mut self) {
        self.decode_seq += 1;
    }

    /// Applies a finished read, unless a newer read has been started since.
    pub fn complete_decode(&mut self, completion: DecodeCompletion) -> Result<&SourceInfo, PipelineError> {
        let DecodeCompletion { ticket, result } = completion;
        if ticket.id() != self.decode_seq {
            log_warn!("DECODE", "discarding stale decode {} (current #{})", ticket, self.decode_seq);
            return Err(PipelineError::StaleDecode {
                ticket: ticket.id(),
                current: self.decode_seq,
            });
        }

        match result {
            Ok(source) => self.apply_bytes(&source.name, &source.bytes, source.kind),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Reads `path` asynchronously and loads it.
    pub async fn load_path_async(&mut self, path: &Path) -> Result<&SourceInfo, PipelineError> {
        let ticket = self.begin_decode();
        let completion = crate::decode::read_source(ticket, path.to_path_buf()).await;
        self.complete_decode(completion)
    }

    /// Drops the table and returns to the configured defaults.
    pub fn reset(&mut self) {
        log_info!("SESSION", "reset");
        self.table = None;
        self.source = None;
        self.criterion = self.config.default_sort.clone();
        self.view_mode = self.config.default_view;
        self.country = self.config.preferred_country.clone();
        self.last_error = None;
        self.invalidate();
    }

    // ------------------------------------------------------------------------
    // Editing and settings
    // ------------------------------------------------------------------------

    /// Replaces one cell with typed input, returning the previous value.
    pub fn edit_cell(&mut self, row: usize, column: &str, input: &str) -> Result<Scalar, PipelineError> {
        let table = self.table.as_mut().ok_or(PipelineError::NoTable)?;
        let previous = table.set_cell(row, column, input)?;
        log_debug!("EDIT", "row={} column={} {:?} -> {:?}", row, column, previous, input);
        Ok(previous)
    }

    pub fn set_sort(&mut self, criterion: SortCriterion) {
        log_debug!("SESSION", "sort={}", criterion);
        self.criterion = criterion;
    }

    /// Sets the sort criterion from its key (`value`, `extra_VAULT`, ...).
    pub fn set_sort_key(&mut self, key: &str) -> Result<(), PipelineError> {
        let criterion =
            SortCriterion::parse(key).ok_or_else(|| PipelineError::UnknownSort(key.to_string()))?;
        self.set_sort(criterion);
        Ok(())
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        log_debug!("SESSION", "view={:?}", view_mode);
        self.view_mode = view_mode;
    }

    /// Chooses the country to render; `None` shows the first one.
    pub fn select_country(&mut self, country: Option<String>) {
        self.country = country;
    }

    // ------------------------------------------------------------------------
    // Derivation
    // ------------------------------------------------------------------------

    /// The aggregation tree for the current table, rebuilt if the table
    /// changed.
    pub fn tree(&mut self) -> Result<&AggregateTree, PipelineError> {
        let table = self.table.as_ref().ok_or(PipelineError::NoTable)?;
        let table_hash = table.content_hash();

        let fresh = matches!(&self.tree_memo, Some(memo) if memo.table_hash == table_hash);
        if !fresh {
            log_debug!("TREE", "rebuilding tree (hash={:016x})", table_hash);
            let tree = build_tree(table);
            match &tree {
                Ok(tree) => log_info!(
                    "TREE",
                    "{} rows used, {} rows excluded (no_country={} no_market={} no_park={} invalid_area={})",
                    tree.rows_used,
                    tree.skipped.total(),
                    tree.skipped.no_country,
                    tree.skipped.no_market,
                    tree.skipped.no_park,
                    tree.skipped.invalid_area
                ),
                Err(e) => log_warn!("TREE", "cannot build tree: {}", e),
            }
            self.tree_memo = Some(TreeMemo { table_hash, tree });
        }

        match self.tree_memo.as_ref().map(|memo| &memo.tree) {
            Some(Ok(tree)) => Ok(tree),
            Some(Err(e)) => Err(e.clone().into()),
            None => Err(PipelineError::NoTable),
        }
    }

    /// What to render for the current table and settings.
    pub fn snapshot(&mut self) -> &Snapshot {
        let Some(table) = self.table.as_ref() else {
            return &self.empty;
        };

        let key = ViewKey {
            table_hash: table.content_hash(),
            criterion: self.criterion.clone(),
            view_mode: self.view_mode,
            country: self.country.clone(),
        };

        if matches!(&self.view_memo, Some(memo) if memo.key == key) {
            log_debug!("VIEW", "memo hit");
        } else {
            log_debug!("VIEW", "memo miss, recalculating {} / {:?}", key.criterion, key.view_mode);
            let snapshot = self.calculate(&key);
            self.view_memo = Some(ViewMemo { key, snapshot });
        }

        match &self.view_memo {
            Some(memo) => &memo.snapshot,
            None => &self.empty,
        }
    }

    fn calculate(&mut self, key: &ViewKey) -> Snapshot {
        let request = self
            .config
            .request(&key.criterion, key.view_mode, key.country.as_deref());
        let headers = self
            .table
            .as_ref()
            .map(|t| t.headers().to_vec())
            .unwrap_or_default();

        match self.tree() {
            Ok(tree) => Snapshot::Ready {
                view: Box::new(calculate_treemap(tree, &request)),
                skipped: tree.skipped,
            },
            Err(e) => {
                let message = e.user_message();
                match e {
                    PipelineError::Build(BuildError::MissingColumns { headers, missing }) => {
                        Snapshot::Diagnostic(Diagnostic {
                            kind: DiagnosticKind::MissingColumns,
                            headers,
                            missing,
                            skipped: SkipCounts::default(),
                            message,
                        })
                    }
                    PipelineError::Build(BuildError::NoValidRows { skipped }) => {
                        Snapshot::Diagnostic(Diagnostic {
                            kind: DiagnosticKind::NoValidRows,
                            headers,
                            missing: Vec::new(),
                            skipped,
                            message,
                        })
                    }
                    _ => Snapshot::Empty,
                }
            }
        }
    }

    fn invalidate(&mut self) {
        self.tree_memo = None;
        self.view_memo = None;
    }

    /// Records a failure without touching the loaded table.
    fn fail(&mut self, err: PipelineError) -> PipelineError {
        log_error!("LOAD", "{}", err);
        self.last_error = Some(LastError::from(&err));
        err
    }
}
