//! Exclusion of already heard or already present tracks

use crate::models::Track;
use std::collections::HashSet;

/// Keeps the candidates whose URI is neither recently played nor already present
///
/// Order is preserved.
pub fn exclude(
    candidates: Vec<Track>,
    recently_played: &HashSet<String>,
    existing: &HashSet<String>,
) -> Vec<Track> {
    candidates
        .into_iter()
        .filter(|track| !recently_played.contains(&track.uri) && !existing.contains(&track.uri))
        .collect()
}

/// URIs that count as already present in the playlist
///
/// Source track URIs plus `"{scheme}:track:{id}"` for every resolved
/// recommendation-engine ID.
pub fn existing_uris(source: &[Track], resolved_ids: &[String], scheme: &str) -> HashSet<String> {
    source
        .iter()
        .map(|track| track.uri.clone())
        .chain(
            resolved_ids
                .iter()
                .map(|id| format!("{}:track:{}", scheme, id)),
        )
        .collect()
}

/// Drops later duplicates by URI, first occurrence wins
pub fn dedup_by_uri(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.uri.clone()))
        .collect()
}
