use std::collections::BTreeMap;

use orderscope_parser::schema::REVIEW_SCORE;
use polars::prelude::*;
use serde::Serialize;

use crate::delivery::DELIVERY_DAYS;

const WHISKER_IQR_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotGroup {
    pub review_score: i64,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub review_score: i64,
}

/// Five-number summary of delivery days per review score, ascending by score.
/// Expects the null-free frame produced by the review join.
pub fn delivery_boxplot(review_join: &DataFrame) -> Result<Vec<BoxplotGroup>, PolarsError> {
    let days = review_join.column(DELIVERY_DAYS)?.i64()?;
    let score = review_join.column(REVIEW_SCORE)?.i64()?;

    let mut by_score: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for idx in 0..review_join.height() {
        if let (Some(d), Some(s)) = (days.get(idx), score.get(idx)) {
            by_score.entry(s).or_default().push(d as f64);
        }
    }

    Ok(by_score
        .into_iter()
        .filter_map(|(review_score, mut values)| {
            values.sort_by(f64::total_cmp);
            summarize(review_score, &values)
        })
        .collect())
}

fn summarize(review_score: i64, sorted: &[f64]) -> Option<BoxplotGroup> {
    let min = *sorted.first()?;
    let max = *sorted.last()?;
    let q1 = quantile(sorted, 0.25);
    let median = quantile(sorted, 0.5);
    let q3 = quantile(sorted, 0.75);
    let reach = WHISKER_IQR_FACTOR * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let whisker_low = inside.first().copied().unwrap_or(min);
    let whisker_high = inside.last().copied().unwrap_or(max);

    Some(BoxplotGroup {
        review_score,
        count: sorted.len(),
        min,
        q1,
        median,
        q3,
        max,
        whisker_low,
        whisker_high,
        outliers: sorted.len() - inside.len(),
    })
}

/// Linear-interpolated quantile of a non-empty, ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Histogram of the non-null delivery durations in `orders`.
pub fn delivery_histogram(orders: &DataFrame, bins: usize) -> Result<Histogram, PolarsError> {
    let days = orders.column(DELIVERY_DAYS)?.i64()?;
    let values: Vec<f64> = (0..orders.height())
        .filter_map(|idx| days.get(idx))
        .map(|d| d as f64)
        .collect();
    Ok(histogram(&values, bins))
}

/// Equal-width bins between the smallest and largest value. Every bin is half-open
/// except the last, which also holds the maximum.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram {
            bins: Vec::new(),
            total: values.len(),
        };
    }

    let mut low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in values {
        let slot = ((value - low) / width).floor() as usize;
        counts[slot.min(bins - 1)] += 1;
    }

    Histogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| HistogramBin {
                lower: low + width * idx as f64,
                upper: if idx + 1 == bins {
                    high
                } else {
                    low + width * (idx + 1) as f64
                },
                count,
            })
            .collect(),
        total: values.len(),
    }
}

/// `(x_column, review_score)` pairs from the item/review join. Rows with a null on
/// either axis cannot be drawn and are skipped here, not in the join.
pub fn scatter_points(
    item_reviews: &DataFrame,
    x_column: &str,
) -> Result<Vec<ScatterPoint>, PolarsError> {
    let x = item_reviews.column(x_column)?.f64()?;
    let score = item_reviews.column(REVIEW_SCORE)?.i64()?;

    Ok((0..item_reviews.height())
        .filter_map(|idx| match (x.get(idx), score.get(idx)) {
            (Some(x), Some(review_score)) => Some(ScatterPoint { x, review_score }),
            _ => None,
        })
        .collect())
}
