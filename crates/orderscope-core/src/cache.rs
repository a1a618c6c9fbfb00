use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use orderscope_parser::DatasetPaths;
use tracing::{debug, info, warn};

use crate::dataset::Dataset;
use crate::error::Result;

/// Process-wide memo of loaded datasets keyed by their file paths. Entries are never
/// evicted; a restart is the only invalidation.
static DATASETS: Lazy<Mutex<HashMap<DatasetPaths, Arc<Dataset>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Entries are inserted only after a load succeeds, so the map behind a poisoned lock
/// is still consistent.
fn datasets() -> MutexGuard<'static, HashMap<DatasetPaths, Arc<Dataset>>> {
    DATASETS.lock().unwrap_or_else(|poisoned| {
        warn!("dataset cache lock poisoned by a panicking loader, recovering");
        DATASETS.clear_poison();
        poisoned.into_inner()
    })
}

/// Reads and derives the dataset without touching the cache.
pub fn load_dataset(paths: &DatasetPaths) -> Result<Dataset> {
    info!(
        orders = %paths.orders.display(),
        reviews = %paths.reviews.display(),
        order_items = %paths.order_items.display(),
        "loading dataset"
    );
    let raw = orderscope_parser::load_dataset(paths)?;
    Dataset::from_raw(raw)
}

/// Returns the cached dataset for `paths`, loading it on first use. Failed loads are
/// not remembered.
pub fn load_dataset_cached(paths: &DatasetPaths) -> Result<Arc<Dataset>> {
    let mut datasets = datasets();

    if let Some(dataset) = datasets.get(paths) {
        debug!(orders = %paths.orders.display(), "dataset cache hit");
        return Ok(Arc::clone(dataset));
    }

    let dataset = Arc::new(load_dataset(paths)?);
    datasets.insert(paths.clone(), Arc::clone(&dataset));
    Ok(dataset)
}

pub fn is_cached(paths: &DatasetPaths) -> bool {
    datasets().contains_key(paths)
}
