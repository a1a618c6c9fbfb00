use std::collections::BTreeMap;

use orderscope_parser::schema::{FREIGHT_VALUE, ORDER_ID, ORDER_STATUS, PRICE, REVIEW_SCORE};
use polars::prelude::*;
use serde::Serialize;

use crate::delivery::DELIVERY_DAYS;

/// What the review join discarded. Orders of some statuses rarely carry a delivery
/// date, so the per-status split shows which bars of the dashboard are thinned out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewJoinReport {
    pub joined_rows: usize,
    pub kept_rows: usize,
    pub null_duration: usize,
    pub null_score: usize,
    pub dropped_by_status: BTreeMap<String, usize>,
}

impl ReviewJoinReport {
    pub fn dropped_rows(&self) -> usize {
        self.joined_rows - self.kept_rows
    }
}

#[derive(Debug, Clone)]
pub struct ReviewJoin {
    /// Columns: order_id, order_status, delivery_time_days, review_score. No nulls in
    /// the last two.
    pub frame: DataFrame,
    pub report: ReviewJoinReport,
}

/// Inner-joins orders (with derived durations) to reviews on `order_id`, then drops
/// rows lacking a duration or a score.
pub fn join_delivery_reviews(
    orders: &DataFrame,
    reviews: &DataFrame,
) -> Result<ReviewJoin, PolarsError> {
    let joined = orders
        .clone()
        .lazy()
        .select([col(ORDER_ID), col(ORDER_STATUS), col(DELIVERY_DAYS)])
        .join(
            reviews
                .clone()
                .lazy()
                .select([col(ORDER_ID), col(REVIEW_SCORE)]),
            [col(ORDER_ID)],
            [col(ORDER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    let status = joined.column(ORDER_STATUS)?.str()?;
    let days = joined.column(DELIVERY_DAYS)?.i64()?;
    let score = joined.column(REVIEW_SCORE)?.i64()?;

    let mut report = ReviewJoinReport {
        joined_rows: joined.height(),
        ..ReviewJoinReport::default()
    };
    for idx in 0..joined.height() {
        let missing_days = days.get(idx).is_none();
        let missing_score = score.get(idx).is_none();
        if missing_days {
            report.null_duration += 1;
        }
        if missing_score {
            report.null_score += 1;
        }
        if missing_days || missing_score {
            let label = status.get(idx).unwrap_or("<null>").to_string();
            *report.dropped_by_status.entry(label).or_insert(0) += 1;
        }
    }

    let frame = joined
        .lazy()
        .filter(
            col(DELIVERY_DAYS)
                .is_not_null()
                .and(col(REVIEW_SCORE).is_not_null()),
        )
        .collect()?;
    report.kept_rows = frame.height();

    Ok(ReviewJoin { frame, report })
}

/// Inner-joins order items to reviews on `order_id`. Nulls are kept.
pub fn join_item_reviews(
    order_items: &DataFrame,
    reviews: &DataFrame,
) -> Result<DataFrame, PolarsError> {
    order_items
        .clone()
        .lazy()
        .select([col(ORDER_ID), col(PRICE), col(FREIGHT_VALUE)])
        .join(
            reviews
                .clone()
                .lazy()
                .select([col(ORDER_ID), col(REVIEW_SCORE)]),
            [col(ORDER_ID)],
            [col(ORDER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()
}
