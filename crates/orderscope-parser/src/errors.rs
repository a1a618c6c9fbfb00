use std::path::PathBuf;

use thiserror::Error;

use crate::model::TableKind;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{table} file {} could not be read: {source}", .path.display())]
    Io {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} CSV error: {source}")]
    Csv {
        table: TableKind,
        #[source]
        source: csv::Error,
    },

    #[error("{table} header is missing required column '{column}'")]
    MissingColumn {
        table: TableKind,
        column: &'static str,
    },

    #[error("{table} data row {line_index} invalid: {message}")]
    DataRow {
        table: TableKind,
        line_index: usize,
        message: String,
    },

    #[error("{table} validation error: {message}")]
    Validation { table: TableKind, message: String },
}

impl LoadError {
    pub fn table(&self) -> TableKind {
        match self {
            LoadError::Io { table, .. }
            | LoadError::Csv { table, .. }
            | LoadError::MissingColumn { table, .. }
            | LoadError::DataRow { table, .. }
            | LoadError::Validation { table, .. } => *table,
        }
    }
}
