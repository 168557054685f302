use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::Row;

/// Number of lookup results remembered during one import.
pub const LOOKUP_CACHE_CAPACITY: usize = 20;

/// Memoizes the first row of `select` assignments, keyed by exact SQL text.
///
/// Entries never expire; once full, the oldest entry is evicted first.
#[derive(Debug)]
pub struct LookupCache {
    capacity: usize,
    order: VecDeque<String>,
    rows: HashMap<String, Row>,
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::with_capacity(LOOKUP_CACHE_CAPACITY)
    }
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            rows: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, sql: &str) -> bool {
        self.rows.contains_key(sql)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.rows.clear();
    }

    /// Stores `row` for `sql`, evicting the oldest entry when full.
    pub fn put(&mut self, sql: String, row: Row) {
        if let Some(slot) = self.rows.get_mut(&sql) {
            *slot = row;
            return;
        }
        if self.capacity == 0 {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                trace!(sql = %oldest, "evicting lookup");
                self.rows.remove(&oldest);
            }
        }
        self.order.push_back(sql.clone());
        self.rows.insert(sql, row);
    }

    /// First row produced by `sql`, from the cache when possible.
    ///
    /// A query without rows yields `None` and is not cached.
    pub fn resolve<G: Gateway + ?Sized>(&mut self, sql: &str, gateway: &mut G) -> Result<Option<Row>> {
        if let Some(row) = self.rows.get(sql) {
            trace!(sql, "lookup cache hit");
            return Ok(Some(row.clone()));
        }
        let output = gateway.execute(sql, &[])?;
        let Some(row) = output.rows.into_iter().next() else {
            return Ok(None);
        };
        self.put(sql.to_string(), row.clone());
        Ok(Some(row))
    }
}
