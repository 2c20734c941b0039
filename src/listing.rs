use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::error::CollocError;

/// Remembers remote directory listings so each one is only fetched once.
///
/// Published listings never change, so entries are kept for the lifetime of the cache. Clones
/// share the same map.
#[derive(Clone, Debug, Default)]
pub struct ListingCache {
    listings: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The listing for `path`, calling `fetch` only if it has not been seen before.
    ///
    /// The lock is not held during `fetch`, so two threads racing on the same path may both fetch
    /// it; the first result stored wins.
    pub fn get_or_fetch<F>(&self, path: &str, fetch: F) -> Result<Vec<String>, CollocError>
    where
        F: FnOnce() -> Result<Vec<String>, CollocError>,
    {
        if let Some(listing) = self.lock()?.get(path) {
            return Ok(listing.clone());
        }

        let listing = fetch()?;
        log::debug!("Fetched listing for {} ({} entries)", path, listing.len());

        let mut listings = self.lock()?;
        Ok(listings
            .entry(path.to_owned())
            .or_insert(listing)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.listings.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<String>>>, CollocError> {
        self.listings
            .lock()
            .map_err(|_| CollocError::transport("listing cache lock poisoned"))
    }
}
