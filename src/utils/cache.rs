// src/utils/cache.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gdal::Dataset;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::Result;

/// Thread-safe cache for GDAL datasets
///
/// A band file read for several indices of one scene is opened once.
#[derive(Default)]
pub struct RasterCache {
    datasets: Mutex<HashMap<PathBuf, Arc<Mutex<Dataset>>>>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_dataset<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Mutex<Dataset>>> {
        let path = path.as_ref();
        let mut cache = self.datasets.lock();

        if let Some(dataset) = cache.get(path) {
            return Ok(Arc::clone(dataset));
        }

        trace!(path = %path.display(), "opening dataset");
        let dataset = Arc::new(Mutex::new(Dataset::open(path)?));
        cache.insert(path.to_path_buf(), Arc::clone(&dataset));

        Ok(dataset)
    }

    pub fn clear(&self) {
        self.datasets.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.datasets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.lock().is_empty()
    }
}
