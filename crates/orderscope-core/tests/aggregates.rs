use std::path::PathBuf;

use orderscope_core::aggregates::{
    mean_delivery_by_status, status_counts, top_customers, CustomerCount, StatusCount,
};
use orderscope_core::{load_dataset, Dataset, DatasetPaths, Result};
use orderscope_parser::{parser_for, TableKind};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../orderscope-parser/tests/data")
}

fn orders_only(csv: &str) -> Result<Dataset> {
    let orders = parser_for(TableKind::Orders).parse(csv.as_bytes())?;
    let reviews = parser_for(TableKind::Reviews).parse(b"order_id,review_score\n")?;
    let items = parser_for(TableKind::OrderItems).parse(b"order_id,price,freight_value\n")?;
    Dataset::from_frames(orders.df, reviews.df, items.df)
}

const HEADER: &str =
    "order_id,customer_id,order_status,order_purchase_timestamp,order_delivered_customer_date\n";

#[test]
fn mean_excludes_null_durations() -> Result<()> {
    let csv = format!(
        "{HEADER}\
         1,a,delivered,2024-01-01,2024-01-03\n\
         2,b,delivered,2024-01-01,\n\
         3,c,delivered,2024-01-01,2024-01-05\n\
         4,d,canceled,2024-01-01,\n"
    );
    let dataset = orders_only(&csv)?;
    let means = mean_delivery_by_status(&dataset.orders)?;

    assert_eq!(means.len(), 1, "canceled has no durations and is omitted");
    assert_eq!(means[0].status, "delivered");
    assert_eq!(means[0].mean_delivery_days, 3.0);
    assert_eq!(means[0].orders_with_duration, 2);
    Ok(())
}

#[test]
fn fixture_mean_includes_inverted_delivery() -> Result<()> {
    let dataset = load_dataset(&DatasetPaths::in_dir(data_dir()))?;
    let means = mean_delivery_by_status(&dataset.orders)?;

    assert_eq!(means.len(), 1);
    assert_eq!(means[0].mean_delivery_days, 3.5);
    Ok(())
}

#[test]
fn top_five_of_six_customers() -> Result<()> {
    let mut csv = HEADER.to_string();
    // Counts A=5 B=4 C=3 D=2 E=1 F=1, interleaved so file order differs from rank.
    let customers = [
        "D", "E", "A", "B", "C", "F", "A", "B", "C", "D", "A", "B", "C", "A", "B", "A",
    ];
    for (id, customer) in customers.iter().enumerate() {
        csv.push_str(&format!("{id},{customer},delivered,2024-01-01,2024-01-02\n"));
    }

    let dataset = orders_only(&csv)?;
    let top = top_customers(&dataset.orders, 5)?;

    let expected: Vec<CustomerCount> = [("A", 5), ("B", 4), ("C", 3), ("D", 2), ("E", 1)]
        .into_iter()
        .map(|(customer_id, orders)| CustomerCount {
            customer_id: customer_id.to_string(),
            orders,
        })
        .collect();
    assert_eq!(top, expected);
    Ok(())
}

#[test]
fn fixture_status_counts_and_top_customers() -> Result<()> {
    let dataset = load_dataset(&DatasetPaths::in_dir(data_dir()))?;

    let counts = status_counts(&dataset.orders)?;
    assert_eq!(
        counts,
        vec![
            StatusCount { status: "delivered".into(), orders: 5 },
            StatusCount { status: "shipped".into(), orders: 1 },
            StatusCount { status: "canceled".into(), orders: 1 },
            StatusCount { status: "invoiced".into(), orders: 1 },
        ]
    );

    let top = top_customers(&dataset.orders, 5)?;
    let ids: Vec<&str> = top.iter().map(|c| c.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);
    assert_eq!(top[0].orders, 3);
    assert_eq!(top[1].orders, 2);
    Ok(())
}

#[test]
fn aggregates_of_empty_frame_are_empty() -> Result<()> {
    let dataset = load_dataset(&DatasetPaths::in_dir(data_dir()))?;
    let empty = dataset.orders.head(Some(0));

    assert!(mean_delivery_by_status(&empty)?.is_empty());
    assert!(status_counts(&empty)?.is_empty());
    assert!(top_customers(&empty, 5)?.is_empty());
    Ok(())
}
