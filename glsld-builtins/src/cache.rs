//! Memoized builtin tables.
//!
//! Building the table of an environment parses thousands of declarations, so tables are built once per
//! [`Environment`] and shared behind an [`Arc`]. The cache is an explicit service object: a host creates one (usually
//! for the lifetime of the process) and hands it to whatever needs builtin tables.
//!
//! Locking is two-level. A short outer lock maps an environment to its slot; the slot's own lock is held while the
//! table is built, so concurrent requests for the same environment wait for a single build while requests for other
//! environments proceed in parallel. Published tables are immutable and read without any lock.

use crate::{config::CacheConfig, env::Environment, error::BuildError, stdlib, table::SymbolTable};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{
  borrow::Cow,
  fmt,
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
};
use tracing::{debug, info, warn};

/// Cache counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
  /// Requests answered with an already built table.
  pub hits: u64,
  /// Requests that had to build a table, successfully or not.
  pub misses: u64,
  /// Successful builds.
  pub builds: u64,
}

#[derive(Debug, Default)]
struct Slot {
  table: Mutex<Option<Arc<SymbolTable>>>,
}

/// Builtin symbol tables, memoized per [`Environment`].
pub struct BuiltinCache {
  source: Cow<'static, str>,
  config: CacheConfig,
  // least recently used first
  slots: Mutex<IndexMap<Environment, Arc<Slot>>>,
  hits: AtomicU64,
  misses: AtomicU64,
  builds: AtomicU64,
}

impl BuiltinCache {
  /// Cache over the embedded builtin declarations.
  pub fn new(config: CacheConfig) -> Self {
    Self::with_source(config, stdlib::SOURCE)
  }

  /// Cache over custom declaration text.
  pub fn with_source(config: CacheConfig, source: impl Into<Cow<'static, str>>) -> Self {
    BuiltinCache {
      source: source.into(),
      config,
      slots: Mutex::new(IndexMap::new()),
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
      builds: AtomicU64::new(0),
    }
  }

  pub fn config(&self) -> &CacheConfig {
    &self.config
  }

  /// Get the table of `env`, building it if needed.
  ///
  /// At most one build runs per environment at any time. A failed build publishes nothing: the error is returned to
  /// the callers waiting on it and the next request tries again.
  pub fn get_or_build(&self, env: &Environment) -> Result<Arc<SymbolTable>, BuildError> {
    let slot = self.slot(env);
    let mut table = slot.table.lock();

    if let Some(table) = table.as_ref() {
      self.hits.fetch_add(1, Ordering::Relaxed);
      debug!(env = %env, "builtin table cache hit");
      return Ok(table.clone());
    }

    self.misses.fetch_add(1, Ordering::Relaxed);

    match stdlib::build_table_from_source(&self.source, env) {
      Ok(built) => {
        let built = Arc::new(built);
        *table = Some(built.clone());
        self.builds.fetch_add(1, Ordering::Relaxed);
        info!(env = %env, symbols = built.len(), "built builtin table");
        Ok(built)
      }

      Err(err) => {
        drop(table);
        warn!(env = %env, error = %err, "cannot build builtin table");

        let mut slots = self.slots.lock();
        if slots.get(env).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
          slots.shift_remove(env);
        }

        Err(err)
      }
    }
  }

  /// Find or create the slot of `env` and mark it most recently used.
  fn slot(&self, env: &Environment) -> Arc<Slot> {
    let mut slots = self.slots.lock();

    if let Some(index) = slots.get_index_of(env) {
      let last = slots.len() - 1;
      slots.move_index(index, last);
      return slots[last].clone();
    }

    let slot = Arc::new(Slot::default());
    slots.insert(*env, slot.clone());

    let capacity = self.config.capacity;
    while capacity != 0 && slots.len() > capacity {
      if let Some((evicted, _)) = slots.shift_remove_index(0) {
        debug!(env = %evicted, "evicted builtin table");
      }
    }

    slot
  }

  /// Drop the table of `env`, if cached.
  ///
  /// Tables already handed out stay alive as long as they are referenced.
  pub fn evict(&self, env: &Environment) -> bool {
    let evicted = self.slots.lock().shift_remove(env).is_some();

    if evicted {
      debug!(env = %env, "evicted builtin table");
    }

    evicted
  }

  pub fn clear(&self) {
    self.slots.lock().clear();
  }

  /// Number of cached environments.
  pub fn len(&self) -> usize {
    self.slots.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      builds: self.builds.load(Ordering::Relaxed),
    }
  }
}

impl Default for BuiltinCache {
  fn default() -> Self {
    Self::new(CacheConfig::default())
  }
}

impl fmt::Debug for BuiltinCache {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("BuiltinCache")
      .field("config", &self.config)
      .field("len", &self.len())
      .field("stats", &self.stats())
      .finish()
  }
}
