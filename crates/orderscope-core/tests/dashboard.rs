use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use orderscope_core::cache::is_cached;
use orderscope_core::{
    build_dashboard, load_dataset, load_dataset_cached, DashboardConfig, DashboardOptions,
    DatasetPaths, PipelineError, Result, StatusSelection,
};
use orderscope_parser::{LoadError, TableKind};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../orderscope-parser/tests/data")
}

fn fixture_paths() -> DatasetPaths {
    DatasetPaths::in_dir(data_dir())
}

#[test]
fn full_view_over_fixture() -> Result<()> {
    let dataset = load_dataset(&fixture_paths())?;
    let view = build_dashboard(
        &dataset,
        &DashboardConfig::default(),
        &DashboardOptions::default(),
    )?;

    assert_eq!(
        view.available_statuses,
        vec!["delivered", "shipped", "canceled", "invoiced"]
    );
    assert_eq!(view.selected_statuses, view.available_statuses);
    assert_eq!(view.filtered_orders, 8);

    let scores: Vec<(i64, usize)> = view
        .delivery_by_score
        .iter()
        .map(|group| (group.review_score, group.count))
        .collect();
    assert_eq!(scores, vec![(1, 1), (2, 2), (4, 1), (5, 1)]);
    let score_two = &view.delivery_by_score[1];
    assert_eq!((score_two.min, score_two.max), (-1.0, 9.0));
    assert_eq!(score_two.median, 4.0);

    assert_eq!(view.delivery_histogram.total, 4);
    assert_eq!(view.delivery_histogram.bins.len(), 30);
    assert_eq!(view.delivery_histogram.bins[0].lower, -1.0);
    assert_eq!(view.delivery_histogram.bins[29].upper, 9.0);

    assert_eq!(view.mean_delivery_by_status.len(), 1);
    assert_eq!(view.mean_delivery_by_status[0].mean_delivery_days, 3.5);

    assert_eq!(view.price_vs_score.len(), 5);
    assert_eq!(view.freight_vs_score.len(), 4);
    assert_eq!(view.status_counts[0].orders, 5);
    assert_eq!(view.top_customers.len(), 5);
    assert_eq!(view.top_customers[0].customer_id, "c1");

    let quality = &view.data_quality;
    assert_eq!(quality.inverted_deliveries, 1);
    assert_eq!(quality.missing_deliveries, 4);
    assert_eq!(quality.unparsed_timestamps, 1);
    assert_eq!(quality.review_join.kept_rows, 5);

    assert!(view.raw_orders.is_none());
    Ok(())
}

#[test]
fn empty_selection_yields_empty_charts() -> Result<()> {
    let dataset = load_dataset(&fixture_paths())?;
    let config = DashboardConfig {
        selected_statuses: StatusSelection::none(),
        show_raw: true,
    };
    let view = build_dashboard(&dataset, &config, &DashboardOptions::default())?;

    assert!(view.selected_statuses.is_empty());
    assert_eq!(view.filtered_orders, 0);
    assert!(view.delivery_by_score.is_empty());
    assert!(view.delivery_histogram.bins.is_empty());
    assert_eq!(view.delivery_histogram.total, 0);
    assert!(view.mean_delivery_by_status.is_empty());
    assert!(view.status_counts.is_empty());
    assert!(view.top_customers.is_empty());
    assert_eq!(view.data_quality.review_join.joined_rows, 0);
    assert_eq!(view.raw_orders, Some(Vec::new()));

    // Price and freight charts ignore the status filter.
    assert_eq!(view.price_vs_score.len(), 5);
    Ok(())
}

#[test]
fn delivered_only_view_with_raw_rows() -> Result<()> {
    let dataset = load_dataset(&fixture_paths())?;
    let config = DashboardConfig {
        selected_statuses: StatusSelection::only(["delivered"]),
        show_raw: true,
    };
    let view = build_dashboard(&dataset, &config, &DashboardOptions::default())?;

    assert_eq!(view.selected_statuses, vec!["delivered"]);
    assert_eq!(view.filtered_orders, 5);
    assert_eq!(
        view.data_quality.review_join.dropped_by_status,
        BTreeMap::from([("delivered".to_string(), 1)])
    );

    let rows = view.raw_orders.expect("raw rows requested");
    let ids: Vec<&str> = rows.iter().map(|row| row.order_id.as_str()).collect();
    assert_eq!(ids, vec!["o1", "o2", "o3", "o6", "o7"]);

    assert_eq!(
        rows[0].order_purchase_timestamp.as_deref(),
        Some("2018-01-01 10:00:00")
    );
    assert_eq!(
        rows[0].order_delivered_customer_date.as_deref(),
        Some("2018-01-05 12:00:00")
    );
    assert_eq!(rows[0].delivery_time_days, Some(4));
    assert!(rows[3].delivery_inverted);
    assert_eq!(rows[3].delivery_time_days, Some(-1));
    assert_eq!(rows[4].order_delivered_customer_date, None);
    assert_eq!(rows[4].delivery_time_days, None);
    Ok(())
}

#[test]
fn raw_row_limit_caps_rows() -> Result<()> {
    let dataset = load_dataset(&fixture_paths())?;
    let config = DashboardConfig {
        selected_statuses: StatusSelection::All,
        show_raw: true,
    };
    let options = DashboardOptions {
        raw_row_limit: Some(3),
        ..DashboardOptions::default()
    };
    let view = build_dashboard(&dataset, &config, &options)?;

    assert_eq!(view.filtered_orders, 8);
    assert_eq!(view.raw_orders.map(|rows| rows.len()), Some(3));
    Ok(())
}

#[test]
fn view_serializes_without_raw_rows_when_hidden() -> Result<()> {
    let dataset = load_dataset(&fixture_paths())?;
    let view = build_dashboard(
        &dataset,
        &DashboardConfig::default(),
        &DashboardOptions::default(),
    )?;
    let json = serde_json::to_value(&view).expect("view serializes");

    assert!(json.get("raw_orders").is_none());
    assert_eq!(json["filtered_orders"], 8);
    assert_eq!(json["top_customers"][0]["customer_id"], "c1");
    Ok(())
}

#[test]
fn config_deserializes_from_widget_state() {
    let config: DashboardConfig =
        serde_json::from_str(r#"{"selected_statuses":{"only":["shipped"]},"show_raw":true}"#)
            .expect("config parses");
    assert_eq!(config.selected_statuses, StatusSelection::only(["shipped"]));
    assert!(config.show_raw);

    let defaults: DashboardConfig = serde_json::from_str("{}").expect("defaults parse");
    assert_eq!(defaults, DashboardConfig::default());
}

#[test]
fn cached_load_returns_the_same_dataset() -> Result<()> {
    let paths = fixture_paths();
    let first = load_dataset_cached(&paths)?;
    let second = load_dataset_cached(&paths)?;

    assert!(Arc::ptr_eq(&first, &second));
    assert!(is_cached(&paths));
    Ok(())
}

#[test]
fn failed_load_names_the_table_and_is_not_cached() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = DatasetPaths::in_dir(dir.path());

    let err = load_dataset_cached(&paths).expect_err("no files present");
    match err {
        PipelineError::Load(LoadError::Io { table, .. }) => assert_eq!(table, TableKind::Orders),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!is_cached(&paths));
}
