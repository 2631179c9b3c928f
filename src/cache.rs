//! Query freshness tracking for data fetched from the backend
//!
//! Mutations never touch fetched data directly. They send an
//! invalidation for the affected [`QueryKey`] and the owner of the data
//! refetches everything marked stale.

use std::collections::HashSet;
use tracing::debug;

/// A class of backend data that can go stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    CurrentUser,
    Scenarios,
    Services,
    PlanNodes,
}

impl QueryKey {
    pub const ALL: [QueryKey; 4] = [
        QueryKey::CurrentUser,
        QueryKey::Scenarios,
        QueryKey::Services,
        QueryKey::PlanNodes,
    ];
}

/// Receiver of "mark stale and refetch" messages
pub trait Invalidate {
    fn invalidate(&mut self, key: QueryKey);
}

/// Load state of one query as seen by a view
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Query<T> {
    #[default]
    Loading,
    Ready(T),
    /// Fetch failed; the view shows this instead of older data
    Unavailable(String),
}

impl<T> Query<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Query::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Set of stale query keys. Everything starts stale.
#[derive(Debug, Clone)]
pub struct QueryCache {
    stale: HashSet<QueryKey>,
    in_flight: HashSet<QueryKey>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self {
            stale: QueryKey::ALL.into_iter().collect(),
            in_flight: HashSet::new(),
        }
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.stale.contains(&key)
    }

    /// Stale keys with no fetch running, now marked in flight. Sorted so
    /// dependent queries (scenarios before plan nodes) go out first.
    pub fn begin_refetch(&mut self) -> Vec<QueryKey> {
        let mut due: Vec<QueryKey> = self
            .stale
            .iter()
            .filter(|key| !self.in_flight.contains(key))
            .copied()
            .collect();
        due.sort();
        for key in &due {
            self.stale.remove(key);
            self.in_flight.insert(*key);
        }
        due
    }

    /// A fetch for `key` finished, successfully or not
    pub fn finish_refetch(&mut self, key: QueryKey) {
        self.in_flight.remove(&key);
    }
}

impl Invalidate for QueryCache {
    fn invalidate(&mut self, key: QueryKey) {
        debug!("Invalidating {:?}", key);
        self.stale.insert(key);
    }
}
