//! FILENAME: tests/test_pipeline.rs
//! Integration tests for loading, editing and rendering through a session.

mod common;

use common::{xlsx_bytes, TestHarness, HEADERS, REFERENCE_CSV, SPARSE_CSV};
use parkmap::{
    tile_caption, ColumnRole, DiagnosticKind, ErrorClass, PipelineError, Scalar, Session,
    SessionConfig, Snapshot, SortCriterion, SourceKind, SortedNode, ViewMode,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn labels(nodes: &[SortedNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.label.as_str()).collect()
}

fn find<'a>(node: &'a SortedNode, label: &str) -> &'a SortedNode {
    node.leaves()
        .find(|leaf| leaf.label == label)
        .or_else(|| node.children.iter().find(|c| c.label == label))
        .unwrap_or_else(|| panic!("no node labelled {}", label))
}

// ============================================================================
// LOAD AND BUILD
// ============================================================================

#[test]
fn test_reference_sheet_is_forward_filled_before_building() {
    let mut harness = TestHarness::with_csv(REFERENCE_CSV);
    let view = harness.view();

    assert_eq!(view.root_label, "Poland");
    assert_eq!(labels(&view.root.children), ["Warsaw"]);
    let warsaw = &view.root.children[0];
    // Park C's blank country is filled from the row above.
    assert_eq!(labels(&warsaw.children), ["Park A", "Park B", "Park C"]);
    assert_eq!(warsaw.value, 16000.0);
    assert_eq!(find(&view.root, "Park A").color_value, Some(0.8));
    assert_eq!(find(&view.root, "Park B").color_value, None);
    assert_eq!(find(&view.root, "Park C").color_value, Some(0.5));
}

#[test]
fn test_sparse_sheet_groups_markets_and_skips_totals() {
    let mut harness = TestHarness::with_csv(SPARSE_CSV);
    let skipped = match harness.session.snapshot() {
        Snapshot::Ready { skipped, .. } => *skipped,
        other => panic!("unexpected snapshot {:?}", other),
    };
    assert_eq!(skipped.no_country, 1);
    assert_eq!(skipped.total(), 1);

    let view = harness.view();
    assert_eq!(view.total_value, 25000.0);
    assert_eq!(labels(&view.root.children), ["PL-Warsaw", "PL-Poznan"]);
    assert_eq!(find(&view.root, "Park B").color_value, Some(0.45));
    assert_eq!(find(&view.root, "Park C").color_value, Some(0.9));

    let tree = harness.session.tree().unwrap();
    assert_eq!(tree.rows_used, 4);
}

#[test]
fn test_spreadsheet_upload_matches_csv() {
    let rows = vec![
        vec!["Poland", "Warsaw", "Park A", "10000", "0.8"],
        vec!["", "", "Park B", "5000", ""],
    ];
    let bytes = xlsx_bytes(&HEADERS, &rows);

    let mut session = Session::default();
    let source = session.load_bytes("parks.xlsx", &bytes, SourceKind::Spreadsheet).unwrap();
    assert_eq!(source.kind, SourceKind::Spreadsheet);
    assert_eq!(source.country_filled, 1);

    let view = session.snapshot().view().cloned().unwrap();
    assert_eq!(view.total_value, 15000.0);
    assert_eq!(find(&view.root, "Park A").color_value, Some(0.8));
}

#[test]
fn test_load_from_disk_records_report() {
    let mut harness = TestHarness::new();
    let path = harness.write_file("parks.csv", SPARSE_CSV.as_bytes());
    let source = harness.session.load_path(&path).unwrap();
    assert_eq!(source.name, "parks.csv");
    assert_eq!(source.report.rows_read, 5);
    assert_eq!(source.report.dropped_columns, 0);
}

// ============================================================================
// DIAGNOSTICS AND FAILURES
// ============================================================================

#[test]
fn test_missing_area_column_yields_diagnostic_and_keeps_table() {
    let csv = "Country,Market,Park,Area\nPoland,Warsaw,Park A,100\n";
    let mut harness = TestHarness::with_csv(csv);

    let diagnostic = harness.session.snapshot().diagnostic().cloned().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::MissingColumns);
    assert_eq!(diagnostic.headers, ["Country", "Market", "Park", "Area"]);
    assert_eq!(diagnostic.missing, vec![ColumnRole::Area]);
    assert!(diagnostic.message.contains("area"));

    // The table stays editable.
    assert_eq!(harness.session.table().unwrap().len(), 1);
    harness.session.edit_cell(0, "Area", "200").unwrap();
    assert_eq!(
        harness.session.table().unwrap().value(0, "Area"),
        Some(&Scalar::Number(200.0))
    );

    let err = harness.session.tree().unwrap_err();
    assert_eq!(err.class(), ErrorClass::MissingColumns);
}

#[test]
fn test_no_valid_rows_is_a_diagnostic() {
    let csv = "Country,Market,Park,Building Area\nPoland,Warsaw,Park A,0\n";
    let mut harness = TestHarness::with_csv(csv);
    let diagnostic = harness.session.snapshot().diagnostic().cloned().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::NoValidRows);
    assert_eq!(diagnostic.skipped.invalid_area, 1);
    assert_eq!(diagnostic.headers.len(), 4);
}

#[test]
fn test_failed_load_retains_previous_table() {
    let mut harness = TestHarness::with_csv(REFERENCE_CSV);
    let before = harness.view();

    let err = harness
        .session
        .load_bytes("empty.csv", b"", SourceKind::Csv)
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::EmptyFile);

    let err = harness
        .session
        .load_bytes("broken.xlsx", b"not a workbook", SourceKind::Spreadsheet)
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::IoFailure);

    let last = harness.session.last_error().unwrap();
    assert_eq!(last.class, ErrorClass::IoFailure);
    assert_eq!(harness.session.source().unwrap().name, "fixture.csv");
    assert_eq!(harness.view(), before);

    // A good load clears the error.
    harness
        .session
        .load_bytes("sparse.csv", SPARSE_CSV.as_bytes(), SourceKind::Csv)
        .unwrap();
    assert!(harness.session.last_error().is_none());
}

#[test]
fn test_unsupported_file_is_rejected() {
    let mut harness = TestHarness::new();
    let path = harness.write_file("parks.pdf", b"%PDF");
    let err = harness.session.load_path(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Load(parkmap::LoadError::UnsupportedFormat(_))));
    assert!(harness.session.table().is_none());
    assert_eq!(harness.session.snapshot(), &Snapshot::Empty);
}

// ============================================================================
// EDITING
// ============================================================================

#[test]
fn test_area_edit_rolls_up() {
    let mut harness = TestHarness::with_csv(REFERENCE_CSV);
    let before = harness.view();
    assert_eq!(find(&before.root, "Warsaw").value, 16000.0);

    let previous = harness.session.edit_cell(0, "Building Area", "20,000").unwrap();
    assert_eq!(previous, Scalar::text("10,000"));

    let after = harness.view();
    assert_eq!(find(&after.root, "Park A").value, 20000.0);
    assert_eq!(find(&after.root, "Warsaw").value, 26000.0);
    assert_eq!(after.total_value, 26000.0);
    for label in ["Park B", "Park C"] {
        assert_eq!(find(&after.root, label), find(&before.root, label));
    }
}

#[test]
fn test_edit_errors() {
    let mut session = Session::default();
    assert!(matches!(session.edit_cell(0, "Country", "x"), Err(PipelineError::NoTable)));

    let mut harness = TestHarness::with_csv(REFERENCE_CSV);
    let err = harness.session.edit_cell(9, "Country", "x").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Edit);
    let err = harness.session.edit_cell(0, "Nope", "x").unwrap_err();
    assert!(matches!(err, PipelineError::Edit(_)));
}

#[test]
fn test_editing_country_to_total_excludes_row() {
    let mut harness = TestHarness::with_csv(REFERENCE_CSV);
    harness.session.edit_cell(1, "Country", "TOTAL").unwrap();
    let view = harness.view();
    assert_eq!(view.total_value, 11000.0);
    assert_eq!(view.tile_count(), 2);
}

// ============================================================================
// SORTING AND VIEWS
// ============================================================================

#[test]
fn test_extra_column_sort_sizes_tiles() {
    let mut harness = TestHarness::with_csv(SPARSE_CSV);
    harness.session.set_sort_key("extra_VAULT").unwrap();
    let view = harness.view();

    assert_eq!(view.sort_label, "Vault");
    assert_eq!(labels(&view.root.children), ["PL-Poznan", "PL-Warsaw"]);
    let poznan = &view.root.children[0];
    assert_eq!(labels(&poznan.children), ["Park D", "Park C"]);
    assert_eq!(poznan.children[0].sort_value, 300.0);
    assert_eq!(poznan.children[1].sort_value, 7500.0);

    let park_a = find(&view.root, "Park A");
    assert_eq!(tile_caption(park_a, &view.criterion), "1,200");
    assert_eq!(tile_caption(park_a, &SortCriterion::Value), "10,000 m²");
}

#[test]
fn test_sort_options_follow_columns() {
    let mut harness = TestHarness::with_csv(SPARSE_CSV);
    let view = harness.view();
    let keys: Vec<_> = view.sort_options.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, ["value", "name", "region", "extra_VAULT", "extra_Grade"]);
    assert_eq!(view.sort_options[3].label, "Vault");
}

#[test]
fn test_country_view_flattens_with_equal_totals() {
    let mut harness = TestHarness::with_csv(SPARSE_CSV);
    let regions = harness.view();

    harness.session.set_view_mode(ViewMode::Country);
    let country = harness.view();

    assert_eq!(regions.total_value, country.total_value);
    assert_eq!(labels(&country.root.children), ["Poland"]);
    let parks = &country.root.children[0].children;
    assert_eq!(labels(parks), ["Park A", "Park C", "Park B", "Park D"]);
    assert_eq!(parks[1].original_region.as_deref(), Some("PL-Poznan"));
    for (i, park) in parks.iter().enumerate() {
        assert_eq!((park.tile_index, park.total_tiles), (i, 4));
    }

    let legend: Vec<_> = country.legend.iter().map(|e| e.region_name.as_str()).collect();
    assert_eq!(legend, ["PL-Warsaw", "PL-Poznan"]);
    assert_eq!(country.legend[0].color.to_hex(), "#fbbf24");
}

#[test]
fn test_repeated_snapshots_serialize_identically() {
    let mut harness = TestHarness::with_csv(SPARSE_CSV);
    harness.session.set_sort(SortCriterion::Name);
    let first = serde_json::to_string(harness.session.snapshot()).unwrap();

    // Force a rebuild through an edit that changes nothing semantically.
    harness.session.edit_cell(0, "Grade", "A").unwrap();
    let second = serde_json::to_string(harness.session.snapshot()).unwrap();
    assert_eq!(first, second);

    let json: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["view"]["criterion"], "name");
    assert_eq!(json["view"]["viewMode"], "regions");
    // Name order puts PL-Poznan first; Park A leads PL-Warsaw.
    let leaf = &json["view"]["root"]["children"][1]["children"][0];
    assert_eq!(leaf["label"], "Park A");
    assert_eq!(leaf["tileIndex"], 0);
    assert_eq!(leaf["extraData"]["VAULT"], "1,200");
    assert_eq!(json["view"]["legend"][1]["color"], "#fbbf24");
}

#[test]
fn test_config_selects_country_and_labels() {
    let csv = "Country,Market,Park,Building Area,VAULT\n\
               Poland,Warsaw,Park A,100,1\n\
               Czechia,Prague,Park P,300,2\n";
    let config = SessionConfig::from_json(
        r#"{"preferredCountry": "Czechia", "sortLabels": {"VAULT": "Vault (EUR)"}, "defaultView": "country"}"#,
    )
    .unwrap();
    let mut harness = TestHarness::with_config(config);
    harness
        .session
        .load_bytes("two.csv", csv.as_bytes(), SourceKind::Csv)
        .unwrap();

    let view = harness.view();
    assert_eq!(view.root_label, "Czechia");
    assert_eq!(view.view_mode, ViewMode::Country);
    assert_eq!(view.total_value, 300.0);
    assert_eq!(view.sort_options[3].label, "Vault (EUR)");

    harness.session.select_country(None);
    assert_eq!(harness.view().root_label, "Poland");
}
