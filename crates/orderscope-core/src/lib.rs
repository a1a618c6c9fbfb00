pub mod aggregates;
pub mod cache;
pub mod charts;
pub mod dashboard;
pub mod dataset;
pub mod delivery;
pub mod error;
pub mod filters;
pub mod joins;

pub use cache::{load_dataset, load_dataset_cached};
pub use dashboard::{build_dashboard, DashboardOptions, DashboardView};
pub use dataset::Dataset;
pub use error::{PipelineError, Result};
pub use filters::{DashboardConfig, StatusSelection};
pub use orderscope_parser::DatasetPaths;
