//! Caller-side build session
//!
//! A [`BuildSession`] owns what survives between builds: the fingerprint and
//! result of the last completed build, and the cancellation token of the
//! build currently in flight. Issuing a new request cancels the previous one.

use crate::builder::{BuildRequest, PlaylistBuilder};
use crate::error::{AltPlaylistError, Result};
use crate::gateway::{MetadataGateway, RecommendationGateway};
use crate::models::{BuildMode, LengthMultiplier, ProgressReport, Track};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Identity of a build: its seed track IDs and its mode
///
/// The length multiplier is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildFingerprint {
    pub track_ids: Vec<String>,
    pub mode: BuildMode,
}

impl BuildFingerprint {
    pub fn new(tracks: &[Track], mode: BuildMode) -> Self {
        Self {
            track_ids: tracks.iter().map(|t| t.id.clone()).collect(),
            mode,
        }
    }
}

/// What a session request ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A new playlist was built and replaced the previous one
    Built(Vec<Track>),
    /// Same seeds and mode as the last completed build; nothing was run
    Unchanged(Vec<Track>),
    /// Cancelled or superseded by a newer request
    Cancelled,
}

impl SessionOutcome {
    /// Tracks of the outcome, empty when cancelled
    pub fn tracks(&self) -> &[Track] {
        match self {
            Self::Built(tracks) | Self::Unchanged(tracks) => tracks,
            Self::Cancelled => &[],
        }
    }
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    in_flight: Option<(u64, CancellationToken)>,
    last: Option<(BuildFingerprint, Vec<Track>)>,
}

/// Serializes builds for one caller
pub struct BuildSession<M, R> {
    builder: Arc<PlaylistBuilder<M, R>>,
    state: Mutex<SessionState>,
}

impl<M, R> BuildSession<M, R>
where
    M: MetadataGateway,
    R: RecommendationGateway,
{
    pub fn new(builder: Arc<PlaylistBuilder<M, R>>) -> Self {
        Self {
            builder,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn builder(&self) -> &Arc<PlaylistBuilder<M, R>> {
        &self.builder
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Builds a playlist from `tracks`, superseding any build in flight
    pub async fn request<F>(
        &self,
        tracks: Vec<Track>,
        multiplier: LengthMultiplier,
        mode: BuildMode,
        on_progress: F,
    ) -> Result<SessionOutcome>
    where
        F: FnMut(ProgressReport),
    {
        let fingerprint = BuildFingerprint::new(&tracks, mode);

        let (generation, token) = {
            let mut state = self.lock_state();
            if let Some((_, previous)) = state.in_flight.take() {
                debug!("Cancelling superseded build");
                previous.cancel();
            }

            if let Some((last, result)) = &state.last {
                if *last == fingerprint {
                    info!("Seeds unchanged since last build, reusing result");
                    return Ok(SessionOutcome::Unchanged(result.clone()));
                }
            }

            state.generation += 1;
            let token = CancellationToken::new();
            state.in_flight = Some((state.generation, token.clone()));
            (state.generation, token)
        };

        let request = BuildRequest::new(tracks, multiplier, mode);
        let result = self.builder.build(&request, &token, on_progress).await;

        let mut state = self.lock_state();
        if matches!(&state.in_flight, Some((current, _)) if *current == generation) {
            state.in_flight = None;
        }

        match result {
            Ok(_) if token.is_cancelled() => Ok(SessionOutcome::Cancelled),
            Ok(tracks) => {
                state.last = Some((fingerprint, tracks.clone()));
                Ok(SessionOutcome::Built(tracks))
            }
            Err(AltPlaylistError::Cancelled) => Ok(SessionOutcome::Cancelled),
            Err(e) => Err(e),
        }
    }

    /// Builds from the last result, in extend mode
    pub async fn extend<F>(
        &self,
        multiplier: LengthMultiplier,
        on_progress: F,
    ) -> Result<SessionOutcome>
    where
        F: FnMut(ProgressReport),
    {
        let seeds = self.last_result().unwrap_or_default();
        if seeds.is_empty() {
            return Err(AltPlaylistError::NothingToExtend);
        }

        self.request(seeds, multiplier, BuildMode::Extend, on_progress)
            .await
    }

    /// Cancels the build in flight, if any
    pub fn cancel(&self) {
        if let Some((_, token)) = self.lock_state().in_flight.take() {
            token.cancel();
        }
    }

    /// Result of the last completed build
    pub fn last_result(&self) -> Option<Vec<Track>> {
        self.lock_state()
            .last
            .as_ref()
            .map(|(_, tracks)| tracks.clone())
    }

    /// Whether a build is currently running
    pub fn is_building(&self) -> bool {
        self.lock_state().in_flight.is_some()
    }
}
