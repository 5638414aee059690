//! Random selection that avoids recently shown pages.

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::app::{BrowseError, Result};
use crate::domain::FeedItem;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_HISTORY_RETAIN: usize = 40;

/// Insertion-ordered set of dispatched URLs. Growing past `limit` trims it
/// to the `retain` most recent.
#[derive(Debug, Clone)]
pub struct RecentlyShown {
    order: VecDeque<String>,
    members: HashSet<String>,
    limit: usize,
    retain: usize,
}

impl Default for RecentlyShown {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_RETAIN)
    }
}

impl RecentlyShown {
    pub fn new(limit: usize, retain: usize) -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
            limit,
            retain: retain.min(limit),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn record(&mut self, url: &str) {
        if self.members.contains(url) {
            self.order.retain(|u| u != url);
        } else {
            self.members.insert(url.to_string());
        }
        self.order.push_back(url.to_string());

        if self.order.len() > self.limit {
            while self.order.len() > self.retain {
                if let Some(old) = self.order.pop_front() {
                    self.members.remove(&old);
                }
            }
        }
    }

    pub fn forget<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) {
        for url in urls {
            if self.members.remove(url) {
                self.order.retain(|u| u != url);
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

pub struct ContentSelector {
    history: RecentlyShown,
    rng: StdRng,
}

impl Default for ContentSelector {
    fn default() -> Self {
        Self::new(RecentlyShown::default())
    }
}

impl ContentSelector {
    pub fn new(history: RecentlyShown) -> Self {
        Self {
            history,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(history: RecentlyShown, seed: u64) -> Self {
        Self {
            history,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn history(&self) -> &RecentlyShown {
        &self.history
    }

    /// Pick uniformly among items not shown recently. When every item in
    /// `pool` has been shown, the pool's history is forgotten and the pick
    /// is made from the whole pool.
    pub fn select_avoiding_recent<'a>(&mut self, pool: &'a [FeedItem]) -> Result<&'a FeedItem> {
        if pool.is_empty() {
            return Err(BrowseError::NoItemsAvailable);
        }

        let fresh: Vec<&FeedItem> = pool
            .iter()
            .filter(|item| !self.history.contains(&item.url))
            .collect();

        let candidates = if fresh.is_empty() {
            debug!("All {} items recently shown, starting over", pool.len());
            self.history.forget(pool.iter().map(|item| item.url.as_str()));
            pool.iter().collect()
        } else {
            fresh
        };

        let chosen = candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or(BrowseError::NoItemsAvailable)?;
        self.history.record(&chosen.url);
        Ok(chosen)
    }
}
