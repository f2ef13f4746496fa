//! FILENAME: parkmap/src/decode.rs
//! PURPOSE: Reads an uploaded file without blocking the caller.
//! CONTEXT: Reading is the only asynchronous step. The session hands out a
//! `DecodeTicket` before the read starts; when the read completes, the
//! completion is applied only if its ticket is still the latest one.

use persistence::{LoadError, SourceKind};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one file read. Later tickets supersede earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DecodeTicket(pub(crate) u64);

impl DecodeTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DecodeTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The bytes of a file and its declared kind.
#[derive(Debug, Clone)]
pub struct SourceBytes {
    pub name: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

/// Outcome of a read, tagged with the ticket it was started under.
#[derive(Debug)]
pub struct DecodeCompletion {
    pub ticket: DecodeTicket,
    pub result: Result<SourceBytes, LoadError>,
}

/// Reads `path` on the tokio runtime. The kind comes from the extension;
/// unsupported extensions fail before any I/O.
pub async fn read_source(ticket: DecodeTicket, path: PathBuf) -> DecodeCompletion {
    let result = read_bytes(&path).await;
    DecodeCompletion { ticket, result }
}

async fn read_bytes(path: &Path) -> Result<SourceBytes, LoadError> {
    let kind = SourceKind::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceBytes { name, kind, bytes })
}
