use std::collections::BTreeSet;

use orderscope_parser::schema::ORDER_STATUS;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which order statuses the dashboard keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSelection {
    /// Every status present in the data, the multi-select default.
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl StatusSelection {
    pub fn only<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StatusSelection::Only(statuses.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        StatusSelection::Only(BTreeSet::new())
    }

    pub fn contains(&self, status: &str) -> bool {
        match self {
            StatusSelection::All => true,
            StatusSelection::Only(set) => set.contains(status),
        }
    }

    /// The selected statuses in the order they appear in `available`.
    pub fn resolve(&self, available: &[String]) -> Vec<String> {
        available
            .iter()
            .filter(|status| self.contains(status))
            .cloned()
            .collect()
    }
}

/// Stand-in for the sidebar widgets: the status multi-select and the raw-rows toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub selected_statuses: StatusSelection,
    #[serde(default)]
    pub show_raw: bool,
}

pub fn filter_by_status(
    orders: &DataFrame,
    selection: &StatusSelection,
) -> Result<DataFrame, PolarsError> {
    let set = match selection {
        StatusSelection::All => return Ok(orders.clone()),
        StatusSelection::Only(set) => set,
    };

    let status = orders.column(ORDER_STATUS)?.str()?;
    let flags: Vec<bool> = (0..orders.height())
        .map(|idx| status.get(idx).is_some_and(|value| set.contains(value)))
        .collect();
    let mask = BooleanChunked::from_slice("status_mask".into(), &flags);

    orders.filter(&mask)
}
