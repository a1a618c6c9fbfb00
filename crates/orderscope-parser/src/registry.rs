use std::fs;
use std::path::Path;

use crate::errors::LoadError;
use crate::model::{DatasetPaths, LoadedTable, RawDataset, TableKind};
use crate::tables::{OrderItemsParser, OrdersParser, ReviewsParser};

pub trait TableParser {
    fn kind(&self) -> TableKind;
    fn parse(&self, content: &[u8]) -> Result<LoadedTable, LoadError>;
}

pub fn parser_for(kind: TableKind) -> &'static dyn TableParser {
    match kind {
        TableKind::Orders => &OrdersParser,
        TableKind::Reviews => &ReviewsParser,
        TableKind::OrderItems => &OrderItemsParser,
    }
}

pub fn load_table(path: &Path, parser: &dyn TableParser) -> Result<LoadedTable, LoadError> {
    let content = fs::read(path).map_err(|source| LoadError::Io {
        table: parser.kind(),
        path: path.to_path_buf(),
        source,
    })?;
    parser.parse(&content)
}

/// Loads all three tables; the first failing table aborts the whole load.
pub fn load_dataset(paths: &DatasetPaths) -> Result<RawDataset, LoadError> {
    let orders = load_table(&paths.orders, parser_for(TableKind::Orders))?;
    let reviews = load_table(&paths.reviews, parser_for(TableKind::Reviews))?;
    let order_items = load_table(&paths.order_items, parser_for(TableKind::OrderItems))?;

    Ok(RawDataset {
        orders,
        reviews,
        order_items,
    })
}
