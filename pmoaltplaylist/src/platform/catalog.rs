//! Track and playlist endpoints

use super::PlatformClient;
use crate::error::{AltPlaylistError, Result};
use crate::models::Track;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Page size requested from the playlist endpoint (platform maximum)
const PLAYLIST_PAGE_SIZE: &str = "100";

/// Response of the `/tracks/{id}` endpoint, also embedded in history, queue and playlist items
#[derive(Debug, Deserialize)]
pub(crate) struct TrackResponse {
    // Null for local files
    #[serde(default)]
    id: Option<String>,
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
    #[serde(default)]
    album: Option<AlbumResponse>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    name: String,
    #[serde(default)]
    images: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    url: String,
    #[serde(default)]
    width: Option<u32>,
}

/// One page of `/playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
struct PlaylistPage {
    items: Vec<PlaylistItemResponse>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResponse {
    // Null for tracks removed from the catalogue
    #[serde(default)]
    track: Option<TrackResponse>,
}

impl TrackResponse {
    /// Converts to a [`Track`], None for local files that have no platform ID
    pub(crate) fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let (album, album_art) = match self.album {
            Some(album) => {
                // Largest image first
                let art = album
                    .images
                    .into_iter()
                    .max_by_key(|image| image.width.unwrap_or(0))
                    .map(|image| image.url);
                (album.name, art)
            }
            None => (String::new(), None),
        };

        Some(Track {
            id,
            name: self.name,
            uri: self.uri,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            album,
            album_art,
        })
    }
}

impl PlatformClient {
    /// Full track data for a platform track ID
    pub async fn get_track(&self, track_id: &str) -> Result<Track> {
        debug!("Fetching track {}", track_id);
        let url = self.endpoint(&format!("/tracks/{}", track_id))?;
        let response: TrackResponse = self.get_json(url).await?;
        response
            .into_track()
            .ok_or_else(|| AltPlaylistError::NotFound(format!("track {}", track_id)))
    }

    /// All tracks of a playlist, following pagination
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        debug!("Fetching tracks of playlist {}", playlist_id);
        let mut url = self.endpoint(&format!("/playlists/{}/tracks", playlist_id))?;
        url.query_pairs_mut().append_pair("limit", PLAYLIST_PAGE_SIZE);

        let mut tracks = Vec::new();
        let mut next = Some(url);

        while let Some(page_url) = next.take() {
            let page: PlaylistPage = self.get_json(page_url).await?;
            let before = tracks.len();
            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter_map(TrackResponse::into_track),
            );
            debug!("Kept {} tracks from playlist page", tracks.len() - before);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        debug!("Playlist {} has {} tracks", playlist_id, tracks.len());
        Ok(tracks)
    }
}
