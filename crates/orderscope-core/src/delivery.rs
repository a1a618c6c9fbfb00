use orderscope_parser::schema::{DELIVERED_TIMESTAMP, PURCHASE_TIMESTAMP};
use polars::prelude::*;
use serde::Serialize;

pub const DELIVERY_DAYS: &str = "delivery_time_days";
pub const DELIVERY_INVERTED: &str = "delivery_inverted";

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub derived: usize,
    /// Orders with no usable purchase or delivery timestamp.
    pub missing: usize,
    /// Orders delivered before they were purchased.
    pub inverted: usize,
}

#[derive(Debug, Clone)]
pub struct DeliveryDerivation {
    pub dataframe: DataFrame,
    pub report: DeliveryReport,
}

/// Whole days between purchase and delivery, floored like a timedelta's `days`
/// component, so 23 hours early is -1 rather than 0.
pub fn delivery_days(purchased_millis: Option<i64>, delivered_millis: Option<i64>) -> Option<i64> {
    let elapsed = delivered_millis? - purchased_millis?;
    Some(elapsed.div_euclid(MILLIS_PER_DAY))
}

fn to_millis(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000_000),
        TimeUnit::Microseconds => value.div_euclid(1_000),
        TimeUnit::Milliseconds => value,
    }
}

/// Appends `delivery_time_days` (nullable) and `delivery_inverted` to the orders table.
pub fn derive_delivery_days(orders: &DataFrame) -> Result<DeliveryDerivation, PolarsError> {
    let len = orders.height();

    let purchased = orders.column(PURCHASE_TIMESTAMP)?.datetime()?;
    let delivered = orders.column(DELIVERED_TIMESTAMP)?.datetime()?;
    let purchased_unit = purchased.time_unit();
    let delivered_unit = delivered.time_unit();

    let mut days: Vec<Option<i64>> = Vec::with_capacity(len);
    let mut inverted: Vec<bool> = Vec::with_capacity(len);
    let mut report = DeliveryReport::default();

    for idx in 0..len {
        let value = delivery_days(
            purchased.get(idx).map(|v| to_millis(v, purchased_unit)),
            delivered.get(idx).map(|v| to_millis(v, delivered_unit)),
        );
        match value {
            Some(d) => {
                report.derived += 1;
                if d < 0 {
                    report.inverted += 1;
                }
            }
            None => report.missing += 1,
        }
        inverted.push(value.is_some_and(|d| d < 0));
        days.push(value);
    }

    let mut output = orders.clone();
    output.hstack_mut(&mut [
        Series::new(DELIVERY_DAYS.into(), days).into(),
        Series::new(DELIVERY_INVERTED.into(), inverted).into(),
    ])?;

    Ok(DeliveryDerivation {
        dataframe: output,
        report,
    })
}
