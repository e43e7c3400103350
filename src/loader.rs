// Dataset loading: fetch, canonicalize, memoize.
//
// A loader owns the store and the alias table, and serves each dataset as a
// shared frame. Datasets load at most once per loader; anything that goes
// wrong on the way (store gone, table missing) degrades to an empty frame
// with a warning, so views always have something to work with.
use crate::error::InsightResult;
use crate::frame::{Frame, Value};
use crate::normalize::AliasTable;
use crate::schema::{col, Dataset};
use crate::store::Store;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// What happened when a dataset was first loaded. The same shape is reused
/// for the console loading summary.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub rows: usize,
    pub degraded: bool,
}

#[derive(Clone)]
struct CacheEntry {
    frame: Arc<Frame>,
    degraded: bool,
}

pub struct Loader {
    store: Store,
    aliases: AliasTable,
    cache: Mutex<HashMap<Dataset, CacheEntry>>,
}

impl Loader {
    pub fn new(store: Store, aliases: AliasTable) -> Self {
        Loader {
            store,
            aliases,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The dataset's frame, loading it on first request. Always returns a
    /// frame; a failed load yields the empty one.
    pub fn frame(&self, dataset: Dataset) -> Arc<Frame> {
        self.entry(dataset).frame
    }

    /// Load every dataset (cache permitting) and report row counts.
    pub fn load_all(&self) -> Vec<DatasetReport> {
        Dataset::ALL
            .iter()
            .map(|&dataset| {
                let entry = self.entry(dataset);
                DatasetReport {
                    dataset,
                    rows: entry.frame.len(),
                    degraded: entry.degraded,
                }
            })
            .collect()
    }

    // The cache lock is held across the load itself, which is what makes
    // population at-most-once per dataset.
    fn entry(&self, dataset: Dataset) -> CacheEntry {
        let mut cache = self.cache.lock().unwrap();
        if let Some(entry) = cache.get(&dataset) {
            debug!(dataset = dataset.key(), "frame cache hit");
            return entry.clone();
        }
        let entry = match self.try_load(dataset) {
            Ok(frame) => CacheEntry {
                frame: Arc::new(frame),
                degraded: false,
            },
            Err(err) => {
                warn!(
                    dataset = dataset.key(),
                    error = %err,
                    "dataset unavailable, serving empty frame"
                );
                CacheEntry {
                    frame: Arc::new(Frame::empty()),
                    degraded: true,
                }
            }
        };
        cache.insert(dataset, entry.clone());
        entry
    }

    fn try_load(&self, dataset: Dataset) -> InsightResult<Frame> {
        let mut frame = self.store.fetch_table(dataset.table_name())?;
        // Region canonicalization only applies where a raw States column
        // exists; measure columns pass through untouched.
        if frame.column_index(col::STATES).is_some() {
            frame.map_column(col::STATES, |cell| {
                Value::Str(self.aliases.canonical_tabular(cell.as_str()))
            })?;
            frame.rename_column(col::STATES, col::STATE)?;
        }
        Ok(frame)
    }
}
