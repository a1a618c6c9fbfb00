use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use orderscope_core::dashboard::OrderRow;
use orderscope_core::DashboardView;

/// Renders every view of the dashboard as terminal tables.
pub fn render(view: &DashboardView) -> String {
    let mut sections = vec![
        format!(
            "Orders: {} (statuses: {})",
            view.filtered_orders,
            if view.selected_statuses.is_empty() {
                "none".to_string()
            } else {
                view.selected_statuses.join(", ")
            }
        ),
        section("Delivery days by review score", boxplot_table(view)),
        section("Delivery time distribution", histogram_table(view)),
        section("Mean delivery days by status", mean_table(view)),
        section(
            "Price vs review score",
            format!("{} points", view.price_vs_score.len()),
        ),
        section(
            "Freight vs review score",
            format!("{} points", view.freight_vs_score.len()),
        ),
        section("Orders by status", status_table(view)),
        section("Top customers", customer_table(view)),
        section("Data quality", quality_table(view)),
    ];

    if let Some(rows) = &view.raw_orders {
        sections.push(section("Raw orders", raw_table(rows)));
    }
    sections.join("\n\n")
}

fn section(title: &str, body: impl std::fmt::Display) -> String {
    format!("{title}\n{body}")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn boxplot_table(view: &DashboardView) -> Table {
    let mut table = new_table(vec![
        "Score", "Orders", "Min", "Q1", "Median", "Q3", "Max", "Outliers",
    ]);
    for group in &view.delivery_by_score {
        table.add_row(vec![
            group.review_score.to_string(),
            group.count.to_string(),
            format!("{:.1}", group.min),
            format!("{:.1}", group.q1),
            format!("{:.1}", group.median),
            format!("{:.1}", group.q3),
            format!("{:.1}", group.max),
            group.outliers.to_string(),
        ]);
    }
    table
}

fn histogram_table(view: &DashboardView) -> Table {
    let mut table = new_table(vec!["From", "To", "Orders"]);
    for bin in view.delivery_histogram.bins.iter().filter(|bin| bin.count > 0) {
        table.add_row(vec![
            format!("{:.1}", bin.lower),
            format!("{:.1}", bin.upper),
            bin.count.to_string(),
        ]);
    }
    table
}

fn mean_table(view: &DashboardView) -> Table {
    let mut table = new_table(vec!["Status", "Mean days", "Orders with duration"]);
    for mean in &view.mean_delivery_by_status {
        table.add_row(vec![
            mean.status.clone(),
            format!("{:.2}", mean.mean_delivery_days),
            mean.orders_with_duration.to_string(),
        ]);
    }
    table
}

fn status_table(view: &DashboardView) -> Table {
    let mut table = new_table(vec!["Status", "Orders"]);
    for count in &view.status_counts {
        table.add_row(vec![count.status.clone(), count.orders.to_string()]);
    }
    table
}

fn customer_table(view: &DashboardView) -> Table {
    let mut table = new_table(vec!["Customer", "Orders"]);
    for customer in &view.top_customers {
        table.add_row(vec![customer.customer_id.clone(), customer.orders.to_string()]);
    }
    table
}

fn quality_table(view: &DashboardView) -> Table {
    let quality = &view.data_quality;
    let join = &quality.review_join;
    let mut table = new_table(vec!["Check", "Count"]);
    table.add_row(vec![
        "Delivered before purchase".to_string(),
        quality.inverted_deliveries.to_string(),
    ]);
    table.add_row(vec![
        "Missing delivery date".to_string(),
        quality.missing_deliveries.to_string(),
    ]);
    table.add_row(vec![
        "Unparsed timestamps".to_string(),
        quality.unparsed_timestamps.to_string(),
    ]);
    table.add_row(vec![
        "Review join rows dropped".to_string(),
        join.dropped_rows().to_string(),
    ]);
    for (status, dropped) in &join.dropped_by_status {
        table.add_row(vec![format!("  dropped ({status})"), dropped.to_string()]);
    }
    table
}

fn raw_table(rows: &[OrderRow]) -> Table {
    let mut table = new_table(vec![
        "Order", "Customer", "Status", "Purchased", "Delivered", "Days",
    ]);
    for row in rows {
        let days = match (row.delivery_time_days, row.delivery_inverted) {
            (Some(days), true) => format!("{days} (inverted)"),
            (Some(days), false) => days.to_string(),
            (None, _) => String::new(),
        };
        table.add_row(vec![
            row.order_id.clone(),
            row.customer_id.clone().unwrap_or_default(),
            row.order_status.clone().unwrap_or_default(),
            row.order_purchase_timestamp.clone().unwrap_or_default(),
            row.order_delivered_customer_date.clone().unwrap_or_default(),
            days,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use orderscope_core::{
        build_dashboard, load_dataset, DashboardConfig, DashboardOptions, DatasetPaths,
        StatusSelection,
    };

    use super::*;

    fn fixture_paths() -> DatasetPaths {
        DatasetPaths::in_dir(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../orderscope-parser/tests/data"),
        )
    }

    #[test]
    fn report_lists_customers_and_raw_rows() -> orderscope_core::Result<()> {
        let dataset = load_dataset(&fixture_paths())?;
        let config = DashboardConfig {
            selected_statuses: StatusSelection::only(["delivered"]),
            show_raw: true,
        };
        let view = build_dashboard(&dataset, &config, &DashboardOptions::default())?;
        let text = render(&view);

        assert!(text.starts_with("Orders: 5 (statuses: delivered)"));
        assert!(text.contains("Top customers"));
        assert!(text.contains("c1"));
        assert!(text.contains("Raw orders"));
        assert!(text.contains("-1 (inverted)"));
        Ok(())
    }

    #[test]
    fn report_omits_raw_rows_when_hidden() -> orderscope_core::Result<()> {
        let dataset = load_dataset(&fixture_paths())?;
        let config = DashboardConfig {
            selected_statuses: StatusSelection::none(),
            show_raw: false,
        };
        let view = build_dashboard(&dataset, &config, &DashboardOptions::default())?;
        let text = render(&view);

        assert!(text.starts_with("Orders: 0 (statuses: none)"));
        assert!(!text.contains("Raw orders"));
        Ok(())
    }
}
