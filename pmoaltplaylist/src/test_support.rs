//! In-memory gateways for unit tests

use crate::error::{AltPlaylistError, Result};
use crate::gateway::{MetadataGateway, RecommendationGateway};
use crate::models::{
    PlayHistoryItem, QueueSnapshot, RecentlyPlayed, SearchCandidate, SuggestRequest,
    SuggestResponse, Track,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recommendation service fake
///
/// Suggestions are keyed by the first seed ID of the batch.
#[derive(Default)]
pub struct FakeRecommender {
    searches: HashMap<String, Vec<SearchCandidate>>,
    suggestions: HashMap<String, Vec<String>>,
    failing_batches: HashSet<String>,
    fail_search: bool,
    cancel_on_search: Option<CancellationToken>,
    cancel_on_suggest: Option<CancellationToken>,
    search_log: Mutex<Vec<String>>,
    suggest_log: Mutex<Vec<SuggestRequest>>,
}

impl FakeRecommender {
    pub fn with_search(mut self, query: &str, candidates: Vec<SearchCandidate>) -> Self {
        self.searches.insert(query.to_string(), candidates);
        self
    }

    /// Resolves the query `"{artist} {name}"` to a single candidate
    pub fn resolving(self, track: &Track, rec_id: &str) -> Self {
        let query = format!("{} {}", track.artists[0], track.name);
        self.with_search(
            &query,
            vec![SearchCandidate {
                track_id: rec_id.to_string(),
                track: track.label(),
            }],
        )
    }

    pub fn with_suggestions(mut self, first_seed: &str, ids: &[&str]) -> Self {
        self.suggestions.insert(
            first_seed.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn failing_batch(mut self, first_seed: &str) -> Self {
        self.failing_batches.insert(first_seed.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Cancels `token` as soon as any search is issued
    pub fn cancel_on_search(mut self, token: CancellationToken) -> Self {
        self.cancel_on_search = Some(token);
        self
    }

    /// Cancels `token` on the first suggestion request, then never answers it
    pub fn cancel_on_suggest(mut self, token: CancellationToken) -> Self {
        self.cancel_on_suggest = Some(token);
        self
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn suggest_requests(&self) -> Vec<SuggestRequest> {
        self.suggest_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationGateway for FakeRecommender {
    async fn search(
        &self,
        query: &str,
        _max_items: Option<u32>,
    ) -> Result<Vec<SearchCandidate>> {
        self.search_log.lock().unwrap().push(query.to_string());
        if let Some(token) = &self.cancel_on_search {
            token.cancel();
        }
        if self.fail_search {
            return Err(AltPlaylistError::from_status_code(500, "search down"));
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }

    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse> {
        self.suggest_log.lock().unwrap().push(request.clone());
        if let Some(token) = &self.cancel_on_suggest {
            token.cancel();
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        let first = request.track_ids.first().cloned().unwrap_or_default();
        if self.failing_batches.contains(&first) {
            return Err(AltPlaylistError::from_status_code(503, "suggest down"));
        }
        Ok(SuggestResponse {
            track_ids: self.suggestions.get(&first).cloned().unwrap_or_default(),
        })
    }
}

/// Streaming platform fake
#[derive(Default)]
pub struct FakePlatform {
    tracks: HashMap<String, Track>,
    recent: Vec<Track>,
    queue: QueueSnapshot,
    fail_recent: bool,
    recent_delay: Option<Duration>,
    details_log: Mutex<Vec<String>>,
}

impl FakePlatform {
    /// Makes `track` available through `track_details` under its ID
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.insert(track.id.clone(), track);
        self
    }

    pub fn with_recent(mut self, tracks: Vec<Track>) -> Self {
        self.recent = tracks;
        self
    }

    pub fn failing_recent(mut self) -> Self {
        self.fail_recent = true;
        self
    }

    /// Holds every recently-played call for `delay`
    pub fn with_recent_delay(mut self, delay: Duration) -> Self {
        self.recent_delay = Some(delay);
        self
    }

    pub fn details_requested(&self) -> Vec<String> {
        self.details_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataGateway for FakePlatform {
    async fn track_details(&self, id: &str) -> Result<Track> {
        self.details_log.lock().unwrap().push(id.to_string());
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| AltPlaylistError::NotFound(format!("track {}", id)))
    }

    async fn recently_played(&self) -> Result<RecentlyPlayed> {
        if let Some(delay) = self.recent_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_recent {
            return Err(AltPlaylistError::from_status_code(401, "token expired"));
        }
        Ok(RecentlyPlayed {
            items: self
                .recent
                .iter()
                .cloned()
                .map(|track| PlayHistoryItem { track })
                .collect(),
        })
    }

    async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        Ok(self.queue.clone())
    }
}
