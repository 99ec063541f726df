use chrono::Local;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::CommitCache;
use crate::error::{Result, ShiplogError};
use crate::model::{CommitSet, DateRange};

/// Today's data changes quickly; historical data is stable.
const TTL_TODAY: Duration = Duration::from_secs(5 * 60);
const TTL_HISTORIC: Duration = Duration::from_secs(60 * 60);

/// Shared cancellation flag handed to in-flight fetches.
///
/// Cancelling does not guarantee the underlying process terminates; it stops
/// the pipeline at the next checkpoint so abandoned work ends early.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Seam to the external commit source (the GitHub CLI in production).
pub trait CommitSource: Send + Sync {
    /// Login name of the currently authenticated identity.
    fn current_user(&self) -> Result<String>;

    /// Commits authored by `author` within the date-range `query`.
    fn fetch(&self, author: &str, query: &str, cancel: &CancelToken) -> Result<CommitSet>;
}

/// Fetches commits for a date range, fronted by the cache.
pub struct CommitRetriever {
    source: Box<dyn CommitSource>,
    cache: Option<Box<dyn CommitCache>>,
    user: Mutex<Option<String>>,
}

impl CommitRetriever {
    pub fn new(source: Box<dyn CommitSource>, cache: Option<Box<dyn CommitCache>>) -> Self {
        Self {
            source,
            cache,
            user: Mutex::new(None),
        }
    }

    /// Resolve the author login once and reuse it for the session.
    pub fn user(&self) -> Result<String> {
        // A poisoned lock only ever guards a resolved login; keep using it.
        let mut cached = self.user.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(user) = cached.as_ref() {
            return Ok(user.clone());
        }
        let user = self.source.current_user()?;
        debug!("resolved authenticated user: {user}");
        *cached = Some(user.clone());
        Ok(user)
    }

    pub fn fetch_range(&self, range: &DateRange, cancel: &CancelToken) -> Result<CommitSet> {
        let today = Local::now().date_naive();
        range.validate(today)?;

        let user = self.user()?;
        let query = range.query();

        if cancel.is_cancelled() {
            return Err(ShiplogError::Cancelled);
        }

        // Cache failures never block retrieval; log and treat as a miss.
        if let Some(cache) = &self.cache {
            match cache.get(&user, &query) {
                Ok(Some(set)) => {
                    debug!("commit cache hit for {query}");
                    return Ok(set);
                }
                Ok(None) => {}
                Err(e) => warn!("commit cache read failed, fetching fresh: {e}"),
            }
        }

        let set = self.source.fetch(&user, &query, cancel)?;
        if set.is_empty() {
            return Err(ShiplogError::NotFound(range.display()));
        }

        if let Some(cache) = &self.cache {
            let ttl = if range.is_today(today) {
                TTL_TODAY
            } else {
                TTL_HISTORIC
            };
            if let Err(e) = cache.set(&user, &query, &set, ttl) {
                warn!("commit cache write failed: {e}");
            }
        }

        Ok(set)
    }
}
