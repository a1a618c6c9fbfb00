use std::collections::HashMap;

use orderscope_parser::schema::{CUSTOMER_ID, ORDER_STATUS};
use polars::prelude::*;
use serde::Serialize;

use crate::delivery::DELIVERY_DAYS;

const MEAN_DELIVERY_DAYS: &str = "mean_delivery_days";
const ORDERS_WITH_DURATION: &str = "orders_with_duration";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMean {
    pub status: String,
    pub mean_delivery_days: f64,
    pub orders_with_duration: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerCount {
    pub customer_id: String,
    pub orders: usize,
}

/// Mean delivery duration per status. Null durations count toward neither the sum
/// nor the denominator; statuses with no duration at all are omitted.
pub fn mean_delivery_by_status(orders: &DataFrame) -> Result<Vec<StatusMean>, PolarsError> {
    let grouped = orders
        .clone()
        .lazy()
        .group_by([col(ORDER_STATUS)])
        .agg([
            col(DELIVERY_DAYS).mean().alias(MEAN_DELIVERY_DAYS),
            col(DELIVERY_DAYS)
                .count()
                .cast(DataType::Int64)
                .alias(ORDERS_WITH_DURATION),
        ])
        .filter(col(MEAN_DELIVERY_DAYS).is_not_null())
        .sort([ORDER_STATUS], SortMultipleOptions::default())
        .collect()?;

    let status = grouped.column(ORDER_STATUS)?.str()?;
    let mean = grouped.column(MEAN_DELIVERY_DAYS)?.f64()?;
    let counted = grouped.column(ORDERS_WITH_DURATION)?.i64()?;

    let mut means = Vec::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        if let (Some(status), Some(mean)) = (status.get(idx), mean.get(idx)) {
            means.push(StatusMean {
                status: status.to_string(),
                mean_delivery_days: mean,
                orders_with_duration: counted.get(idx).unwrap_or(0).max(0) as usize,
            });
        }
    }
    Ok(means)
}

/// Frequency of each status, most frequent first.
pub fn status_counts(orders: &DataFrame) -> Result<Vec<StatusCount>, PolarsError> {
    let status = orders.column(ORDER_STATUS)?.str()?;
    let ranked = ranked_counts((0..orders.height()).map(|idx| status.get(idx)));
    Ok(ranked
        .into_iter()
        .map(|(status, orders)| StatusCount { status, orders })
        .collect())
}

/// The `limit` customers with the most orders.
pub fn top_customers(orders: &DataFrame, limit: usize) -> Result<Vec<CustomerCount>, PolarsError> {
    let customer = orders.column(CUSTOMER_ID)?.str()?;
    let ranked = ranked_counts((0..orders.height()).map(|idx| customer.get(idx)));
    Ok(ranked
        .into_iter()
        .take(limit)
        .map(|(customer_id, orders)| CustomerCount {
            customer_id,
            orders,
        })
        .collect())
}

/// Counts non-null values and orders them by count descending. Equal counts keep the
/// order in which each value first appeared.
fn ranked_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut position: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values.into_iter().flatten() {
        match position.get(value) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                position.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
