use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use orderscope_core::{DashboardOptions, DatasetPaths};
use orderscope_parser::TableKind;
use serde::Deserialize;

pub const DATA_DIR_VAR: &str = "ORDERSCOPE_DATA_DIR";
pub const BIND_VAR: &str = "ORDERSCOPE_BIND";

const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Runtime settings: TOML file, then environment, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub orders_file: PathBuf,
    pub reviews_file: PathBuf,
    pub order_items_file: PathBuf,
    pub bind: String,
    pub dashboard: DashboardOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            orders_file: TableKind::Orders.default_file_name().into(),
            reviews_file: TableKind::Reviews.default_file_name().into(),
            order_items_file: TableKind::OrderItems.default_file_name().into(),
            bind: DEFAULT_BIND.to_string(),
            dashboard: DashboardOptions::default(),
        }
    }
}

impl Settings {
    /// Reads `config` if given and applies environment overrides.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at '{}'", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse settings TOML from '{}'", path.display()))
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(BIND_VAR).filter(|v| !v.is_empty()) {
            self.bind = bind;
        }
    }

    /// File names are resolved against `data_dir` unless absolute.
    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths::new(
            self.data_dir.join(&self.orders_file),
            self.data_dir.join(&self.reviews_file),
            self.data_dir.join(&self.order_items_file),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_working_directory() {
        let settings = Settings::default();
        assert_eq!(settings.bind, "127.0.0.1:8501");
        assert_eq!(settings.dashboard.histogram_bins, 30);
        assert_eq!(
            settings.dataset_paths(),
            DatasetPaths::in_dir(".")
        );
    }

    #[test]
    fn toml_overrides_only_the_keys_it_names() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("orderscope.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/olist"
orders_file = "orders.csv"

[dashboard]
top_customers = 10
raw_row_limit = 200
"#,
        )?;

        let settings = Settings::from_file(&path)?;
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.dashboard.top_customers, 10);
        assert_eq!(settings.dashboard.histogram_bins, 30);
        assert_eq!(settings.dashboard.raw_row_limit, Some(200));

        let paths = settings.dataset_paths();
        assert_eq!(paths.orders, PathBuf::from("/srv/olist/orders.csv"));
        assert_eq!(
            paths.reviews,
            PathBuf::from("/srv/olist/order_reviews_dataset.csv")
        );
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("orderscope.toml");
        std::fs::write(&path, "data_directory = \"/tmp\"\n")?;

        assert!(Settings::from_file(&path).is_err());
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> =
            HashMap::from([(DATA_DIR_VAR, "/data"), (BIND_VAR, "0.0.0.0:9000")]);
        let mut settings = Settings {
            data_dir: PathBuf::from("/from-file"),
            ..Settings::default()
        };
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.data_dir, PathBuf::from("/data"));
        assert_eq!(settings.bind, "0.0.0.0:9000");
    }

    #[test]
    fn empty_environment_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|_| Some(String::new()));
        assert_eq!(settings, Settings::default());
    }
}
