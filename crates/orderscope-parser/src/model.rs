use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Orders,
    Reviews,
    OrderItems,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders",
            TableKind::Reviews => "reviews",
            TableKind::OrderItems => "order_items",
        }
    }

    /// File name the public dataset ships this table under.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders_dataset.csv",
            TableKind::Reviews => "order_reviews_dataset.csv",
            TableKind::OrderItems => "order_items_dataset.csv",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locations of the three input tables. Also the identity of a cached load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetPaths {
    pub orders: PathBuf,
    pub reviews: PathBuf,
    pub order_items: PathBuf,
}

impl DatasetPaths {
    pub fn new(
        orders: impl Into<PathBuf>,
        reviews: impl Into<PathBuf>,
        order_items: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orders: orders.into(),
            reviews: reviews.into(),
            order_items: order_items.into(),
        }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(TableKind::Orders.default_file_name()),
            dir.join(TableKind::Reviews.default_file_name()),
            dir.join(TableKind::OrderItems.default_file_name()),
        )
    }

    pub fn path_for(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Orders => &self.orders,
            TableKind::Reviews => &self.reviews,
            TableKind::OrderItems => &self.order_items,
        }
    }
}

/// Per-table counters gathered while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub rows: usize,
    /// Non-empty timestamp cells that matched no known format, per column.
    pub unparsed_timestamps: Vec<(String, usize)>,
    pub ignored_columns: Vec<String>,
}

impl TableReport {
    pub fn total_unparsed_timestamps(&self) -> usize {
        self.unparsed_timestamps.iter().map(|(_, count)| count).sum()
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub kind: TableKind,
    pub df: DataFrame,
    pub report: TableReport,
}

#[derive(Debug, Clone)]
pub struct RawDataset {
    pub orders: LoadedTable,
    pub reviews: LoadedTable,
    pub order_items: LoadedTable,
}
