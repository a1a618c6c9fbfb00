use chrono::DateTime;
use orderscope_parser::schema::{
    CUSTOMER_ID, DELIVERED_TIMESTAMP, FREIGHT_VALUE, ORDER_ID, ORDER_STATUS, PRICE,
    PURCHASE_TIMESTAMP,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregates::{
    mean_delivery_by_status, status_counts, top_customers, CustomerCount, StatusCount, StatusMean,
};
use crate::charts::{
    delivery_boxplot, delivery_histogram, scatter_points, BoxplotGroup, Histogram, ScatterPoint,
};
use crate::dataset::Dataset;
use crate::delivery::{DELIVERY_DAYS, DELIVERY_INVERTED};
use crate::error::{PipelineError, Result};
use crate::filters::{filter_by_status, DashboardConfig};
use crate::joins::{join_delivery_reviews, ReviewJoinReport};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardOptions {
    pub histogram_bins: usize,
    pub top_customers: usize,
    /// Cap on raw rows returned when the raw view is on; `None` returns all.
    pub raw_row_limit: Option<usize>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            top_customers: 5,
            raw_row_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub order_status: Option<String>,
    pub order_purchase_timestamp: Option<String>,
    pub order_delivered_customer_date: Option<String>,
    pub delivery_time_days: Option<i64>,
    pub delivery_inverted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQuality {
    pub inverted_deliveries: usize,
    pub missing_deliveries: usize,
    pub unparsed_timestamps: usize,
    pub review_join: ReviewJoinReport,
}

/// Everything the dashboard draws for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub available_statuses: Vec<String>,
    pub selected_statuses: Vec<String>,
    pub filtered_orders: usize,
    pub delivery_by_score: Vec<BoxplotGroup>,
    pub delivery_histogram: Histogram,
    pub mean_delivery_by_status: Vec<StatusMean>,
    pub price_vs_score: Vec<ScatterPoint>,
    pub freight_vs_score: Vec<ScatterPoint>,
    pub status_counts: Vec<StatusCount>,
    pub top_customers: Vec<CustomerCount>,
    pub data_quality: DataQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_orders: Option<Vec<OrderRow>>,
}

/// Runs one pass of the pipeline for the given filter state.
pub fn build_dashboard(
    dataset: &Dataset,
    config: &DashboardConfig,
    options: &DashboardOptions,
) -> Result<DashboardView> {
    let available_statuses = dataset.distinct_statuses()?;
    let selected_statuses = config.selected_statuses.resolve(&available_statuses);

    let filtered = filter_by_status(&dataset.orders, &config.selected_statuses)?;
    debug!(
        selected = selected_statuses.len(),
        rows = filtered.height(),
        "filtered orders"
    );

    let review_join = join_delivery_reviews(&filtered, &dataset.reviews)?;
    debug!(
        joined = review_join.report.joined_rows,
        kept = review_join.report.kept_rows,
        "joined delivery durations to reviews"
    );

    let item_reviews = dataset.item_reviews()?;

    let summary = &dataset.summary;
    let data_quality = DataQuality {
        inverted_deliveries: summary.delivery.inverted,
        missing_deliveries: summary.delivery.missing,
        unparsed_timestamps: summary.orders.total_unparsed_timestamps(),
        review_join: review_join.report.clone(),
    };

    let raw_orders = if config.show_raw {
        Some(order_rows(&filtered, options.raw_row_limit)?)
    } else {
        None
    };

    Ok(DashboardView {
        available_statuses,
        selected_statuses,
        filtered_orders: filtered.height(),
        delivery_by_score: delivery_boxplot(&review_join.frame)?,
        delivery_histogram: delivery_histogram(&filtered, options.histogram_bins)?,
        mean_delivery_by_status: mean_delivery_by_status(&filtered)?,
        price_vs_score: scatter_points(item_reviews, PRICE)?,
        freight_vs_score: scatter_points(item_reviews, FREIGHT_VALUE)?,
        status_counts: status_counts(&filtered)?,
        top_customers: top_customers(&filtered, options.top_customers)?,
        data_quality,
        raw_orders,
    })
}

/// Filtered order rows for the raw view, in table order.
pub fn order_rows(orders: &DataFrame, limit: Option<usize>) -> Result<Vec<OrderRow>> {
    let order_id = orders.column(ORDER_ID)?.str()?;
    let customer = orders.column(CUSTOMER_ID)?.str()?;
    let status = orders.column(ORDER_STATUS)?.str()?;
    let purchased = orders.column(PURCHASE_TIMESTAMP)?.datetime()?;
    let delivered = orders.column(DELIVERED_TIMESTAMP)?.datetime()?;
    let days = orders.column(DELIVERY_DAYS)?.i64()?;
    let inverted = orders.column(DELIVERY_INVERTED)?.bool()?;

    let purchased_unit = purchased.time_unit();
    let delivered_unit = delivered.time_unit();
    let count = limit.map_or(orders.height(), |cap| cap.min(orders.height()));

    let mut rows = Vec::with_capacity(count);
    for idx in 0..count {
        let order_id = order_id.get(idx).ok_or_else(|| {
            PipelineError::Validation(format!("order row {idx} has no order_id"))
        })?;
        rows.push(OrderRow {
            order_id: order_id.to_string(),
            customer_id: customer.get(idx).map(str::to_string),
            order_status: status.get(idx).map(str::to_string),
            order_purchase_timestamp: purchased
                .get(idx)
                .and_then(|v| format_timestamp(v, purchased_unit)),
            order_delivered_customer_date: delivered
                .get(idx)
                .and_then(|v| format_timestamp(v, delivered_unit)),
            delivery_time_days: days.get(idx),
            delivery_inverted: inverted.get(idx).unwrap_or(false),
        });
    }
    Ok(rows)
}

fn format_timestamp(value: i64, unit: TimeUnit) -> Option<String> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }?;
    Some(dt.naive_utc().format(TIMESTAMP_FORMAT).to_string())
}
