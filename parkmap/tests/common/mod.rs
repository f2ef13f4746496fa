//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for pipeline integration tests.

#![allow(dead_code)]

use parkmap::{Session, SessionConfig, Snapshot, SourceKind, TreemapView};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADERS: [&str; 5] = [
    "Country",
    "Prologis Market",
    "Park/Bucket",
    "Building Area",
    "Occupancy %",
];

/// The three-row sheet used throughout the scenario tests.
pub const REFERENCE_CSV: &str = "Country,Prologis Market,Park/Bucket,Building Area,Occupancy %\n\
                                 Poland,Warsaw,Park A,\"10,000\",80%\n\
                                 Poland,Warsaw,Park B,\"5,000\",\n\
                                 ,Warsaw,Park C,\"1,000\",50%\n";

/// A sparse export: labels written once per group, extra columns, a
/// subtotal row.
pub const SPARSE_CSV: &str = "Country,Prologis Market,Park/Bucket,Building Area,Occupancy %,VAULT,Grade\n\
                              Poland,PL-Warsaw,Park A,\"10,000\",80%,\"1,200\",A\n\
                              ,,Park B,\"5,000\",45,800,B\n\
                              ,PL-Poznan,Park C,\"7,500\",0.9,,A\n\
                              ,,Park D,\"2,500\",,300,\n\
                              Total,,,\"25,000\",,,\n";

/// Test harness owning a session and a scratch directory.
pub struct TestHarness {
    pub session: Session,
    pub dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        TestHarness {
            session: Session::new(config),
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Harness with `csv` already loaded.
    pub fn with_csv(csv: &str) -> Self {
        let mut harness = Self::new();
        harness
            .session
            .load_bytes("fixture.csv", csv.as_bytes(), SourceKind::Csv)
            .expect("fixture loads");
        harness
    }

    /// Writes a file into the scratch directory.
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create fixture");
        file.write_all(bytes).expect("write fixture");
        path
    }

    /// The current view; panics if the snapshot is not ready.
    pub fn view(&mut self) -> TreemapView {
        match self.session.snapshot() {
            Snapshot::Ready { view, .. } => (**view).clone(),
            other => panic!("expected a ready snapshot, got {:?}", other),
        }
    }
}

/// Builds an XLSX workbook from string rows; numeric-looking cells in the
/// area column are written as numbers.
pub fn xlsx_bytes(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32 + 1, col as u16);
            match cell.parse::<f64>() {
                Ok(n) => sheet.write_number(r, c, n).unwrap(),
                Err(_) => sheet.write_string(r, c, *cell).unwrap(),
            };
        }
    }
    workbook.save_to_buffer().unwrap()
}
