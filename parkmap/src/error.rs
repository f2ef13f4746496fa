//! FILENAME: parkmap/src/error.rs
//! PURPOSE: Pipeline errors and their user-facing classification.

use persistence::LoadError;
use serde::Serialize;
use std::path::PathBuf;
use tabular::EditError;
use thiserror::Error;
use treemap_engine::BuildError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("no table loaded")]
    NoTable,

    #[error("unknown sort criterion: {0}")]
    UnknownSort(String),

    #[error("decode {ticket} was superseded by {current}")]
    StaleDecode { ticket: u64, current: u64 },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot read configuration {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The broad failure categories shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    IoFailure,
    EmptyFile,
    NoColumns,
    MissingColumns,
    NoValidRows,
    Edit,
    NoTable,
    Stale,
    Config,
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Load(LoadError::EmptyFile) => ErrorClass::EmptyFile,
            PipelineError::Load(LoadError::NoColumns) => ErrorClass::NoColumns,
            PipelineError::Load(_) => ErrorClass::IoFailure,
            PipelineError::Build(BuildError::MissingColumns { .. }) => ErrorClass::MissingColumns,
            PipelineError::Build(BuildError::NoValidRows { .. }) => ErrorClass::NoValidRows,
            PipelineError::Edit(_) | PipelineError::UnknownSort(_) => ErrorClass::Edit,
            PipelineError::NoTable => ErrorClass::NoTable,
            PipelineError::StaleDecode { .. } => ErrorClass::Stale,
            PipelineError::Config(_) | PipelineError::ConfigRead { .. } => ErrorClass::Config,
        }
    }

    /// Short message suitable for a banner.
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::IoFailure => format!("Error reading file: {}", self),
            ErrorClass::EmptyFile => "The file is empty or contains no data rows.".to_string(),
            ErrorClass::NoColumns => "No columns were found in the file.".to_string(),
            ErrorClass::MissingColumns => {
                format!("Cannot build the visualization: {}.", self)
            }
            ErrorClass::NoValidRows => {
                "No rows with a country, market, park and positive area were found.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// A failure remembered by the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub class: ErrorClass,
    pub message: String,
}

impl From<&PipelineError> for LastError {
    fn from(err: &PipelineError) -> Self {
        LastError {
            class: err.class(),
            message: err.user_message(),
        }
    }
}
