//! Resolution of platform tracks to recommendation-engine IDs

use crate::cache::SharedIdCache;
use crate::gateway::RecommendationGateway;
use crate::models::{SearchCandidate, Track};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps source tracks into the recommendation engine's ID space
///
/// Cached resolutions are reused; otherwise the engine's fuzzy search is
/// queried with `"{artist} {name}"`.
pub struct TrackResolver<R> {
    gateway: Arc<R>,
    cache: SharedIdCache,
    search_limit: Option<u32>,
}

impl<R: RecommendationGateway> TrackResolver<R> {
    pub fn new(gateway: Arc<R>, cache: SharedIdCache) -> Self {
        Self {
            gateway,
            cache,
            search_limit: None,
        }
    }

    /// Maximum number of search candidates requested per track
    pub fn with_search_limit(mut self, limit: Option<u32>) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn cache(&self) -> &SharedIdCache {
        &self.cache
    }

    /// Recommendation-engine ID for `track`, or None when the engine doesn't know it
    ///
    /// Search failures are logged and reported as a miss.
    pub async fn resolve(&self, track: &Track) -> Option<String> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(id) = cache.get(&track.uri).map(|entry| entry.id.clone()) {
                debug!("Validated ID for {} found in cache", track.uri);
                cache.put(&track.uri, &id);
                return Some(id);
            }
        }

        let query = search_query(track);
        let candidates = match self.gateway.search(&query, self.search_limit).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Search failed for '{}': {}", query, e);
                return None;
            }
        };

        let chosen = pick_candidate(track, &candidates)?.track_id.clone();
        debug!("Resolved {} to {}", track.uri, chosen);

        self.cache.lock().await.put(&track.uri, &chosen);
        Some(chosen)
    }
}

fn search_query(track: &Track) -> String {
    match track.primary_artist() {
        Some(artist) => format!("{} {}", artist, track.name),
        None => track.name.clone(),
    }
}

/// Candidate whose ID equals the track's platform ID, else the top-ranked one
fn pick_candidate<'a>(
    track: &Track,
    candidates: &'a [SearchCandidate],
) -> Option<&'a SearchCandidate> {
    let exact = track
        .platform_id()
        .and_then(|pid| candidates.iter().find(|c| c.track_id == pid));

    exact.or_else(|| candidates.first())
}
