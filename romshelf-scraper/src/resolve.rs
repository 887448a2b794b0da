//! The matching seam between local candidates and the remote catalog.
//!
//! The dispatcher knows nothing about how a ROM is matched to a catalog
//! entry; it only sees the [`Resolver`] contract. The default strategy
//! (name + size + system id against ScreenScraper) lives on the gateway.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::error::ScrapeError;
use crate::scan::CandidateItem;
use crate::types::RemoteRecord;

/// Match a local candidate against the remote catalog.
///
/// `Ok(None)` means the catalog has no entry for this candidate; that is a
/// lookup result, not an error.
pub trait Resolver: Send + Sync {
    fn resolve(
        &self,
        item: &CandidateItem,
    ) -> impl Future<Output = Result<Option<RemoteRecord>, ScrapeError>> + Send;
}

/// Fetch raw asset bytes by the URL a resolve produced.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ScrapeError>> + Send;
}

/// Per-run deduplication of resolves.
///
/// A candidate's metadata job and its asset jobs may run concurrently; all
/// of them share one remote lookup through this cache. Lookup results
/// (including NotFound) are cached for the run; errors are not, so the next
/// job for the same candidate gets a fresh try.
#[derive(Default)]
pub struct ResolveCache {
    slots: Mutex<HashMap<String, Arc<OnceCell<Option<RemoteRecord>>>>>,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve_with<R: Resolver>(
        &self,
        resolver: &R,
        item: &CandidateItem,
    ) -> Result<Option<RemoteRecord>, ScrapeError> {
        let cell = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(item.file_name.clone())
                .or_default()
                .clone()
        };
        cell.get_or_try_init(|| resolver.resolve(item))
            .await
            .map(|record| record.clone())
    }
}
