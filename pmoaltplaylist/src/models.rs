//! Data structures shared by the gateways and the pipeline

use crate::error::AltPlaylistError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flexible deserializer for IDs sent either as strings or as integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// A streaming-platform track
///
/// Tracks are cloned between components; nothing mutates them after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Platform track identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Opaque platform reference, `<scheme>:track:<id>`
    pub uri: String,
    /// Artist names, primary artist first
    #[serde(default)]
    pub artists: Vec<String>,
    /// Album name
    #[serde(default)]
    pub album: String,
    /// Album artwork URL
    #[serde(default)]
    pub album_art: Option<String>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Platform-native ID embedded in the URI (third colon-delimited segment)
    pub fn platform_id(&self) -> Option<&str> {
        self.uri.split(':').nth(2)
    }

    /// "Artist - Name", or the name alone for tracks without artists
    pub fn label(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} - {}", artist, self.name),
            None => self.name.clone(),
        }
    }
}

/// One ranked result of the recommendation service's fuzzy search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Recommendation-engine track ID
    #[serde(deserialize_with = "deserialize_id")]
    pub track_id: String,
    /// Human readable label of the candidate
    #[serde(default)]
    pub track: String,
}

/// Payload of a suggestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub track_ids: Vec<String>,
    pub size: u8,
    pub creativity: f64,
    pub noise: f64,
}

/// Suggested recommendation-engine IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// One entry of the user's listening history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayHistoryItem {
    pub track: Track,
}

/// Recently played tracks, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyPlayed {
    #[serde(default)]
    pub items: Vec<PlayHistoryItem>,
}

impl RecentlyPlayed {
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.track.uri.as_str())
    }
}

/// Current player state: the playing track and what is queued after it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub currently_playing: Option<Track>,
    #[serde(default)]
    pub queue: Vec<Track>,
}

impl QueueSnapshot {
    /// Seed tracks for a build: the playing track followed by the queue
    pub fn source_tracks(&self) -> Vec<Track> {
        self.currently_playing
            .iter()
            .chain(self.queue.iter())
            .cloned()
            .collect()
    }
}

/// User-selected factor (1 to 5) controlling batch sizing and suggestions per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LengthMultiplier(u8);

impl LengthMultiplier {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for LengthMultiplier {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for LengthMultiplier {
    type Error = AltPlaylistError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AltPlaylistError::InvalidMultiplier(value))
        }
    }
}

impl From<LengthMultiplier> for u8 {
    fn from(value: LengthMultiplier) -> Self {
        value.0
    }
}

impl fmt::Display for LengthMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// How a build picks its seeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Fresh recommendations from the current seeds
    #[default]
    Alternative,
    /// The previous output becomes the seed set
    Extend,
}

impl FromStr for BuildMode {
    type Err = AltPlaylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alternative" => Ok(Self::Alternative),
            "extend" => Ok(Self::Extend),
            other => Err(AltPlaylistError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternative => f.write_str("alternative"),
            Self::Extend => f.write_str("extend"),
        }
    }
}

/// Progress notification emitted while a build runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub phase: String,
    /// 0 to 100
    pub percentage: u8,
}

impl ProgressReport {
    pub fn new(phase: impl Into<String>, percentage: u8) -> Self {
        Self {
            phase: phase.into(),
            percentage: percentage.min(100),
        }
    }
}

#[cfg(test)]
pub(crate) fn track(id: &str, name: &str, artist: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("platform:track:{}", id),
        artists: vec![artist.to_string()],
        album: format!("{} album", name),
        album_art: None,
    }
}
