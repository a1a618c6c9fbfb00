pub mod errors;
pub mod model;
mod registry;
pub mod tables;

pub use errors::LoadError;
pub use model::{DatasetPaths, LoadedTable, RawDataset, TableKind, TableReport};
pub use registry::{load_dataset, load_table, parser_for, TableParser};
pub use tables::schema;
