use std::collections::HashSet;

use once_cell::sync::OnceCell;
use orderscope_parser::schema::ORDER_STATUS;
use orderscope_parser::{RawDataset, TableReport};
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::delivery::{derive_delivery_days, DeliveryReport};
use crate::error::Result;
use crate::joins::join_item_reviews;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    pub orders: TableReport,
    pub reviews: TableReport,
    pub order_items: TableReport,
    pub delivery: DeliveryReport,
}

/// The three tables after delivery derivation. Read-only for its whole life.
#[derive(Debug)]
pub struct Dataset {
    pub orders: DataFrame,
    pub reviews: DataFrame,
    pub order_items: DataFrame,
    pub summary: LoadSummary,
    item_reviews: OnceCell<DataFrame>,
}

impl Dataset {
    pub fn from_raw(raw: RawDataset) -> Result<Self> {
        let mut dataset =
            Self::from_frames(raw.orders.df, raw.reviews.df, raw.order_items.df)?;
        dataset.summary.orders = raw.orders.report;
        dataset.summary.reviews = raw.reviews.report;
        dataset.summary.order_items = raw.order_items.report;

        for report in [
            &dataset.summary.orders,
            &dataset.summary.reviews,
            &dataset.summary.order_items,
        ] {
            for (column, count) in &report.unparsed_timestamps {
                if *count > 0 {
                    warn!(column = %column, count, "timestamps coerced to null");
                }
            }
        }

        info!(
            orders = dataset.orders.height(),
            reviews = dataset.reviews.height(),
            order_items = dataset.order_items.height(),
            "dataset ready"
        );
        Ok(dataset)
    }

    /// Builds a dataset from already-typed frames; `orders` must carry the purchase
    /// and delivery timestamp columns as datetimes.
    pub fn from_frames(
        orders: DataFrame,
        reviews: DataFrame,
        order_items: DataFrame,
    ) -> Result<Self> {
        let derivation = derive_delivery_days(&orders)?;
        let delivery = derivation.report;
        if delivery.inverted > 0 {
            warn!(
                inverted = delivery.inverted,
                "orders delivered before purchase; durations kept as negative values"
            );
        }

        Ok(Self {
            orders: derivation.dataframe,
            reviews,
            order_items,
            summary: LoadSummary {
                delivery,
                ..LoadSummary::default()
            },
            item_reviews: OnceCell::new(),
        })
    }

    /// Distinct non-null statuses in first-appearance order.
    pub fn distinct_statuses(&self) -> Result<Vec<String>> {
        let status = self.orders.column(ORDER_STATUS)?.str()?;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut distinct = Vec::new();
        for value in (0..self.orders.height()).filter_map(|idx| status.get(idx)) {
            if seen.insert(value) {
                distinct.push(value.to_string());
            }
        }
        Ok(distinct)
    }

    /// Items joined to reviews. Independent of any status filter, so it is computed
    /// once per dataset.
    pub fn item_reviews(&self) -> Result<&DataFrame> {
        let joined = self
            .item_reviews
            .get_or_try_init(|| join_item_reviews(&self.order_items, &self.reviews))?;
        Ok(joined)
    }
}
