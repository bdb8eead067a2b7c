//! Playlist builder
//!
//! Sequences one build end to end:
//!
//! 1. fetch the recently played tracks (fatal on failure),
//! 2. resolve every source track to a recommendation-engine ID,
//! 3. request suggestions batch by batch and expand them into tracks,
//! 4. drop heard and already present tracks, dedupe by URI.
//!
//! Every await is raced against the build's cancellation token. Once the
//! token fires no further progress is reported and the build returns
//! [`AltPlaylistError::Cancelled`].
//!
//! The observable [`BuildState`] belongs to the most recent build: a build
//! that has been overtaken by a newer one no longer writes to it.

use crate::batcher::{BatchSettings, RecommendationBatcher};
use crate::cache::SharedIdCache;
use crate::cancel::{ensure_active, until_cancelled};
use crate::error::{AltPlaylistError, Result};
use crate::filter::{dedup_by_uri, exclude, existing_uris};
use crate::gateway::{MetadataGateway, RecommendationGateway};
use crate::models::{BuildMode, LengthMultiplier, ProgressReport, Track};
use crate::platform::DEFAULT_URI_SCHEME;
use crate::resolver::TrackResolver;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const PHASE_FETCHING_RECENT: &str = "Fetching recently played tracks";
pub const PHASE_RESOLVING: &str = "Resolving tracks";
pub const PHASE_SUGGESTIONS: &str = "Fetching suggestions";

/// Where a build currently stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildState {
    #[default]
    Idle,
    FetchingRecent,
    ResolvingTracks,
    FetchingSuggestions,
    Completed,
    Aborted,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::FetchingRecent => "fetching-recent",
            Self::ResolvingTracks => "resolving-tracks",
            Self::FetchingSuggestions => "fetching-suggestions",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Seeds and sizing of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub tracks: Vec<Track>,
    pub multiplier: LengthMultiplier,
    pub mode: BuildMode,
}

impl BuildRequest {
    pub fn new(tracks: Vec<Track>, multiplier: LengthMultiplier, mode: BuildMode) -> Self {
        Self {
            tracks,
            multiplier,
            mode,
        }
    }
}

/// Orchestrates resolver, batcher and exclusion filter
pub struct PlaylistBuilder<M, R> {
    metadata: Arc<M>,
    resolver: TrackResolver<R>,
    batcher: RecommendationBatcher<M, R>,
    uri_scheme: String,
    state: watch::Sender<BuildState>,
    generation: AtomicU64,
}

impl<M, R> PlaylistBuilder<M, R>
where
    M: MetadataGateway,
    R: RecommendationGateway,
{
    pub fn new(metadata: Arc<M>, recommender: Arc<R>, cache: SharedIdCache) -> Self {
        Self {
            resolver: TrackResolver::new(recommender.clone(), cache),
            batcher: RecommendationBatcher::new(metadata.clone(), recommender),
            metadata,
            uri_scheme: DEFAULT_URI_SCHEME.to_string(),
            state: watch::Sender::new(BuildState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_batch_settings(mut self, settings: BatchSettings) -> Self {
        self.batcher = self.batcher.with_settings(settings);
        self
    }

    pub fn with_search_limit(mut self, limit: Option<u32>) -> Self {
        self.resolver = self.resolver.with_search_limit(limit);
        self
    }

    /// Scheme used to rebuild platform URIs from resolved IDs
    pub fn with_uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uri_scheme = scheme.into();
        self
    }

    pub fn cache(&self) -> &SharedIdCache {
        self.resolver.cache()
    }

    pub fn state(&self) -> BuildState {
        *self.state.borrow()
    }

    /// Watches state transitions of every subsequent build
    pub fn subscribe(&self) -> watch::Receiver<BuildState> {
        self.state.subscribe()
    }

    /// Runs one build
    ///
    /// Returns the alternative playlist, [`AltPlaylistError::Cancelled`] when
    /// `token` fired, or the fatal error that stopped the build.
    pub async fn build<F>(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
        mut on_progress: F,
    ) -> Result<Vec<Track>>
    where
        F: FnMut(ProgressReport),
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.run(generation, request, token, &mut on_progress).await;

        match &result {
            Ok(tracks) => {
                info!(tracks = tracks.len(), mode = %request.mode, "Build completed");
                self.set_state(generation, BuildState::Completed);
            }
            Err(AltPlaylistError::Cancelled) => {
                info!("Build cancelled");
                self.set_state(generation, BuildState::Aborted);
            }
            Err(e) => {
                warn!("Build failed: {}", e);
                self.set_state(generation, BuildState::Idle);
            }
        }

        result
    }

    async fn run<F>(
        &self,
        generation: u64,
        request: &BuildRequest,
        token: &CancellationToken,
        on_progress: &mut F,
    ) -> Result<Vec<Track>>
    where
        F: FnMut(ProgressReport),
    {
        let mut report = |phase: &str, percentage: u8| {
            if !token.is_cancelled() {
                on_progress(ProgressReport::new(phase, percentage));
            }
        };

        ensure_active(token)?;
        info!(
            sources = request.tracks.len(),
            multiplier = %request.multiplier,
            mode = %request.mode,
            "Starting build"
        );

        self.set_state(generation, BuildState::FetchingRecent);
        let recent = until_cancelled(token, self.metadata.recently_played()).await??;
        let recently_played: HashSet<String> = recent.uris().map(str::to_string).collect();
        debug!(tracks = recently_played.len(), "Recently played fetched");
        report(PHASE_FETCHING_RECENT, 10);

        self.set_state(generation, BuildState::ResolvingTracks);
        report(PHASE_RESOLVING, 20);
        let total = request.tracks.len();
        let mut resolved = Vec::with_capacity(total);
        for (index, track) in request.tracks.iter().enumerate() {
            if let Some(id) = until_cancelled(token, self.resolver.resolve(track)).await? {
                resolved.push(id);
            }
            report(PHASE_RESOLVING, scale(20, 50, index + 1, total));
        }
        info!(resolved = resolved.len(), sources = total, "Tracks resolved");

        ensure_active(token)?;
        self.set_state(generation, BuildState::FetchingSuggestions);
        report(PHASE_SUGGESTIONS, 50);
        let suggestions = self
            .batcher
            .run(&resolved, request.multiplier, token, |done, batches| {
                report(PHASE_SUGGESTIONS, scale(50, 100, done, batches))
            })
            .await?;

        ensure_active(token)?;
        let existing = existing_uris(&request.tracks, &resolved, &self.uri_scheme);
        let candidates = suggestions.len();
        let tracks = dedup_by_uri(exclude(suggestions, &recently_played, &existing));
        debug!(candidates, kept = tracks.len(), "Suggestions filtered");

        Ok(tracks)
    }

    /// Publishes `state` unless a newer build has started since `generation`
    fn set_state(&self, generation: u64, state: BuildState) {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(%state, "Superseded build, state left to the newer one");
                return false;
            }
            *current = state;
            true
        });
    }
}

/// Linear interpolation of `done / total` between `from` and `to`
fn scale(from: u8, to: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return to;
    }
    let span = f64::from(to - from);
    let ratio = done.min(total) as f64 / total as f64;
    from + (span * ratio).round() as u8
}
