//! Seams between the pipeline and the outside world
//!
//! The pipeline only needs the handful of operations below. The HTTP clients
//! in [`crate::platform`] and [`crate::recommender`] implement them; tests use
//! in-memory fakes.

use crate::error::Result;
use crate::models::{
    QueueSnapshot, RecentlyPlayed, SearchCandidate, SuggestRequest, SuggestResponse, Track,
};
use async_trait::async_trait;

/// Streaming platform: track metadata, listening history and player queue
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// Full track data for a platform track ID
    async fn track_details(&self, id: &str) -> Result<Track>;

    /// The user's recently played tracks
    async fn recently_played(&self) -> Result<RecentlyPlayed>;

    /// Currently playing track and queue
    async fn queue_snapshot(&self) -> Result<QueueSnapshot>;
}

/// External recommendation service
#[async_trait]
pub trait RecommendationGateway: Send + Sync {
    /// Ranked fuzzy search, best candidate first
    async fn search(
        &self,
        query: &str,
        max_items: Option<u32>,
    ) -> Result<Vec<SearchCandidate>>;

    /// Suggestions seeded by a batch of recommendation-engine IDs
    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse>;
}
