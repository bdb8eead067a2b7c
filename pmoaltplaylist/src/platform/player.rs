//! Listening history and player queue endpoints

use super::catalog::TrackResponse;
use super::PlatformClient;
use crate::error::Result;
use crate::models::{PlayHistoryItem, QueueSnapshot, RecentlyPlayed};
use serde::Deserialize;
use tracing::debug;

/// Response of `/me/player/recently-played`
#[derive(Debug, Deserialize)]
struct RecentlyPlayedResponse {
    #[serde(default)]
    items: Vec<HistoryItemResponse>,
}

#[derive(Debug, Deserialize)]
struct HistoryItemResponse {
    track: TrackResponse,
}

/// Response of `/me/player/queue`
#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    currently_playing: Option<TrackResponse>,
    #[serde(default)]
    queue: Vec<TrackResponse>,
}

impl PlatformClient {
    /// The user's recently played tracks, most recent first
    pub async fn recently_played(&self) -> Result<RecentlyPlayed> {
        let mut url = self.endpoint("/me/player/recently-played")?;
        url.query_pairs_mut()
            .append_pair("limit", &self.recently_played_limit.to_string());

        let response: RecentlyPlayedResponse = self.get_json(url).await?;
        debug!("Received {} recently played tracks", response.items.len());

        Ok(RecentlyPlayed {
            items: response
                .items
                .into_iter()
                .filter_map(|item| item.track.into_track())
                .map(|track| PlayHistoryItem { track })
                .collect(),
        })
    }

    /// Currently playing track and the tracks queued after it
    pub async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        let url = self.endpoint("/me/player/queue")?;
        let response: QueueResponse = self.get_json(url).await?;
        debug!(
            "Queue snapshot: playing={}, queued={}",
            response.currently_playing.is_some(),
            response.queue.len()
        );

        Ok(QueueSnapshot {
            currently_playing: response
                .currently_playing
                .and_then(TrackResponse::into_track),
            queue: response
                .queue
                .into_iter()
                .filter_map(TrackResponse::into_track)
                .collect(),
        })
    }

    /// Appends a track URI to the player queue
    pub async fn add_to_queue(&self, uri: &str) -> Result<()> {
        let mut url = self.endpoint("/me/player/queue")?;
        url.query_pairs_mut().append_pair("uri", uri);
        self.post_empty(url).await
    }
}
