//! Batched suggestion requests
//!
//! Resolved seed IDs are split into consecutive chunks of
//! `round(base_batch_size / multiplier)` IDs. Each chunk becomes one
//! suggestion request asking for `multiplier` suggestions per seed; the
//! suggested IDs are then expanded into full tracks through the platform.
//!
//! Batches run strictly one after another. Within a batch the metadata
//! lookups run concurrently.

use crate::cancel::{ensure_active, until_cancelled};
use crate::error::Result;
use crate::gateway::{MetadataGateway, RecommendationGateway};
use crate::models::{LengthMultiplier, SuggestRequest, Track};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Seeds per suggestion request at multiplier 1
pub const DEFAULT_BASE_BATCH_SIZE: usize = 40;

pub const DEFAULT_CREATIVITY: f64 = 0.99;

pub const DEFAULT_NOISE: f64 = 0.0;

/// Tuning of the suggestion requests
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub base_batch_size: usize,
    pub creativity: f64,
    pub noise: f64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            base_batch_size: DEFAULT_BASE_BATCH_SIZE,
            creativity: DEFAULT_CREATIVITY,
            noise: DEFAULT_NOISE,
        }
    }
}

impl BatchSettings {
    /// Seeds per request for `multiplier`, never below 1
    pub fn chunk_size(&self, multiplier: LengthMultiplier) -> usize {
        let size = (self.base_batch_size as f64 / f64::from(multiplier.get())).round() as usize;
        size.max(1)
    }
}

/// Turns resolved seed IDs into suggested tracks, one request per batch
pub struct RecommendationBatcher<M, R> {
    metadata: Arc<M>,
    recommender: Arc<R>,
    settings: BatchSettings,
}

impl<M, R> RecommendationBatcher<M, R>
where
    M: MetadataGateway,
    R: RecommendationGateway,
{
    pub fn new(metadata: Arc<M>, recommender: Arc<R>) -> Self {
        Self {
            metadata,
            recommender,
            settings: BatchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Consecutive chunks that will each become one suggestion request
    pub fn plan<'a>(&self, ids: &'a [String], multiplier: LengthMultiplier) -> Vec<&'a [String]> {
        ids.chunks(self.settings.chunk_size(multiplier)).collect()
    }

    /// Runs every batch in order and concatenates the suggested tracks
    ///
    /// `on_batch(done, total)` is called after each batch, skipped or not.
    /// A failing batch contributes nothing; only cancellation aborts the run.
    pub async fn run<F>(
        &self,
        ids: &[String],
        multiplier: LengthMultiplier,
        token: &CancellationToken,
        mut on_batch: F,
    ) -> Result<Vec<Track>>
    where
        F: FnMut(usize, usize),
    {
        let batches = self.plan(ids, multiplier);
        let total = batches.len();
        let mut tracks = Vec::new();

        debug!(
            seeds = ids.len(),
            batches = total,
            "Requesting suggestions"
        );

        for (index, chunk) in batches.into_iter().enumerate() {
            ensure_active(token)?;

            match until_cancelled(token, self.run_batch(chunk, multiplier)).await? {
                Ok(batch_tracks) => {
                    debug!(batch = index, tracks = batch_tracks.len(), "Batch completed");
                    tracks.extend(batch_tracks);
                }
                Err(e) => warn!(batch = index, "Batch skipped: {}", e),
            }

            on_batch(index + 1, total);
        }

        Ok(tracks)
    }

    async fn run_batch(&self, chunk: &[String], multiplier: LengthMultiplier) -> Result<Vec<Track>> {
        let request = SuggestRequest {
            track_ids: chunk.to_vec(),
            size: multiplier.get(),
            creativity: self.settings.creativity,
            noise: self.settings.noise,
        };

        let response = self.recommender.suggest(&request).await?;
        let lookups = response
            .track_ids
            .iter()
            .map(|id| self.metadata.track_details(id));

        try_join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::track;
    use crate::test_support::{FakePlatform, FakeRecommender};

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{}", i)).collect()
    }

    fn multiplier(m: u8) -> LengthMultiplier {
        LengthMultiplier::try_from(m).unwrap()
    }

    fn batcher(
        platform: FakePlatform,
        recommender: FakeRecommender,
    ) -> (
        RecommendationBatcher<FakePlatform, FakeRecommender>,
        Arc<FakePlatform>,
        Arc<FakeRecommender>,
    ) {
        let platform = Arc::new(platform);
        let recommender = Arc::new(recommender);
        (
            RecommendationBatcher::new(platform.clone(), recommender.clone()),
            platform,
            recommender,
        )
    }

    #[test]
    fn test_chunk_size_rounds_and_never_hits_zero() {
        let settings = BatchSettings::default();
        let sizes: Vec<_> = (1..=5).map(|m| settings.chunk_size(multiplier(m))).collect();
        assert_eq!(sizes, vec![40, 20, 13, 10, 8]);

        let tiny = BatchSettings {
            base_batch_size: 1,
            ..BatchSettings::default()
        };
        assert_eq!(tiny.chunk_size(multiplier(5)), 1);
    }

    #[test]
    fn test_call_count_is_ceil_of_n_over_chunk() {
        let (batcher, _, _) = batcher(FakePlatform::default(), FakeRecommender::default());
        for m in 1..=5 {
            let chunk = BatchSettings::default().chunk_size(multiplier(m));
            for n in [0, 1, 13, 39, 40, 41, 100] {
                let ids = ids(n);
                assert_eq!(batcher.plan(&ids, multiplier(m)).len(), n.div_ceil(chunk));
            }
        }
    }

    #[tokio::test]
    async fn test_45_ids_make_two_requests_of_40_and_5() {
        let (batcher, _, recommender) =
            batcher(FakePlatform::default(), FakeRecommender::default());
        let token = CancellationToken::new();
        let mut progress = Vec::new();

        batcher
            .run(&ids(45), multiplier(1), &token, |done, total| {
                progress.push((done, total))
            })
            .await
            .unwrap();

        let requests = recommender.suggest_requests();
        let sizes: Vec<_> = requests.iter().map(|r| r.track_ids.len()).collect();
        assert_eq!(sizes, vec![40, 5]);
        assert!(requests.iter().all(|r| r.size == 1));
        assert!(requests.iter().all(|r| r.creativity == 0.99 && r.noise == 0.0));
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped_and_order_kept() {
        let platform = FakePlatform::default()
            .with_track(track("a", "A", "x"))
            .with_track(track("b", "B", "x"))
            .with_track(track("c", "C", "x"));
        let recommender = FakeRecommender::default()
            .with_suggestions("r0", &["b", "a"])
            .failing_batch("r20")
            .with_suggestions("r40", &["c"]);
        let (batcher, _, recommender) = batcher(platform, recommender);

        let tracks = batcher
            .run(&ids(50), multiplier(2), &CancellationToken::new(), |_, _| {})
            .await
            .unwrap();

        let names: Vec<_> = tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        assert_eq!(recommender.suggest_requests().len(), 3);
        assert!(recommender.suggest_requests().iter().all(|r| r.size == 2));
    }

    #[tokio::test]
    async fn test_metadata_failure_drops_whole_batch() {
        let platform = FakePlatform::default().with_track(track("a", "A", "x"));
        let recommender = FakeRecommender::default().with_suggestions("r0", &["a", "missing"]);
        let (batcher, platform, _) = batcher(platform, recommender);

        let tracks = batcher
            .run(&ids(3), multiplier(1), &CancellationToken::new(), |_, _| {})
            .await
            .unwrap();

        assert!(tracks.is_empty());
        assert_eq!(platform.details_requested().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_request() {
        let (batcher, _, recommender) =
            batcher(FakePlatform::default(), FakeRecommender::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = batcher.run(&ids(10), multiplier(1), &token, |_, _| {}).await;

        assert!(result.unwrap_err().is_cancelled());
        assert!(recommender.suggest_requests().is_empty());
    }
}
