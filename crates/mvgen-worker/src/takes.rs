//! Take generation: schedule N independent takes, then render them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use mvgen_media::composite::{ArtifactProbe, BoxError, FsArtifactProbe};
use mvgen_media::metrics;
use mvgen_media::{BeatScheduler, SongTiming};
use mvgen_models::{ArtifactNames, RenderPlan};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// Turns a render plan into a video file. Implemented by the encoder integration.
#[async_trait]
pub trait TakeRenderer: Send + Sync {
    async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<(), BoxError>;
}

/// What to schedule.
#[derive(Debug, Clone)]
pub struct TakeRequest {
    pub timing: SongTiming,
    /// Take indices to schedule, in output order.
    pub indices: Vec<usize>,
    pub names: ArtifactNames,
}

impl TakeRequest {
    /// Request every take `0..takes`.
    pub fn all(timing: SongTiming, takes: usize, names: ArtifactNames) -> Self {
        Self {
            timing,
            indices: (0..takes).collect(),
            names,
        }
    }
}

/// Schedules and renders the takes of one song.
#[derive(Clone)]
pub struct TakeGenerator {
    scheduler: Arc<BeatScheduler>,
    probe: Arc<dyn ArtifactProbe>,
    max_render_parallel: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl TakeGenerator {
    pub fn new(scheduler: Arc<BeatScheduler>) -> Self {
        Self {
            scheduler,
            probe: Arc::new(FsArtifactProbe),
            max_render_parallel: 6,
            cancel: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ArtifactProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_max_render_parallel(mut self, max: usize) -> Self {
        self.max_render_parallel = max.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Schedule every requested take in parallel.
    ///
    /// Take `i` draws from its own generator seeded with `seed + i`, so a
    /// seeded run is reproducible regardless of thread scheduling or of which
    /// takes are requested. Any failed take fails the whole call.
    pub fn schedule_all(&self, request: &TakeRequest) -> WorkerResult<Vec<RenderPlan>> {
        let base_seed = self.scheduler.config().seed;

        let plans = request
            .indices
            .par_iter()
            .map(|&index| {
                let mut rng = match base_seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                    None => StdRng::from_os_rng(),
                };
                self.scheduler.schedule(
                    &request.timing,
                    index,
                    request.names.take(index),
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            takes = plans.len(),
            mode = self.scheduler.pacing().as_str(),
            cuts = plans.iter().map(RenderPlan::len).sum::<usize>(),
            "Scheduled takes"
        );

        Ok(plans)
    }

    /// Indices in `0..takes` whose artifact is not in `dir` yet.
    pub async fn pending(&self, dir: &Path, names: &ArtifactNames, takes: usize) -> Vec<usize> {
        let mut pending = Vec::new();
        for index in 0..takes {
            if !self.probe.exists(&dir.join(names.take(index))).await {
                pending.push(index);
            }
        }
        pending
    }

    /// Render every plan into `dir`, skipping takes that already exist.
    ///
    /// Returns the artifact paths in take order.
    pub async fn render_all(
        &self,
        plans: &[RenderPlan],
        dir: &Path,
        renderer: Arc<dyn TakeRenderer>,
    ) -> WorkerResult<Vec<PathBuf>> {
        let semaphore = Arc::new(Semaphore::new(self.max_render_parallel));

        let futures: Vec<_> = plans
            .iter()
            .map(|plan| {
                let semaphore = semaphore.clone();
                let renderer = renderer.clone();
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| WorkerError::internal("Render semaphore closed"))?;
                    self.check_cancelled()?;
                    self.render_one(plan, dir, renderer.as_ref()).await
                }
            })
            .collect();

        join_all(futures).await.into_iter().collect()
    }

    async fn render_one(
        &self,
        plan: &RenderPlan,
        dir: &Path,
        renderer: &dyn TakeRenderer,
    ) -> WorkerResult<PathBuf> {
        let output = dir.join(&plan.artifact);

        if self.probe.exists(&output).await {
            debug!(take = plan.take_index, output = %output.display(), "Take exists, skipping");
            metrics::record_take_rendered("skipped");
            return Ok(output);
        }

        debug!(
            take = plan.take_index,
            cuts = plan.len(),
            output = %output.display(),
            "Rendering take"
        );

        renderer.render(plan, &output).await.map_err(|e| {
            WorkerError::render_failed(format!("take {}: {}", plan.take_index, e))
        })?;

        if !self.probe.exists(&output).await {
            return Err(WorkerError::render_failed(format!(
                "take {} produced no artifact at {}",
                plan.take_index,
                output.display()
            )));
        }

        metrics::record_take_rendered("rendered");
        Ok(output)
    }

    fn check_cancelled(&self) -> WorkerResult<()> {
        match &self.cancel {
            Some(rx) if *rx.borrow() => Err(WorkerError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Indices of the take artifacts for `names` in `dir`, highest first.
pub async fn discover_takes(dir: &Path, names: &ArtifactNames) -> WorkerResult<Vec<usize>> {
    let mut found = Vec::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        if let Some(index) = names.parse_take_index(&file_name.to_string_lossy()) {
            found.push(index);
        }
    }

    found.sort_unstable_by(|a, b| b.cmp(a));
    Ok(found)
}

/// Reduction leaves for a run of `takes` takes: `dir/{take(i)}` for `i`
/// from `takes - 1` down to 0.
///
/// Fails when `dir` holds takes of the same song outside `0..takes`, since
/// they belong to a different run layout.
pub async fn take_leaves(
    dir: &Path,
    names: &ArtifactNames,
    takes: usize,
) -> WorkerResult<Vec<PathBuf>> {
    let stray: Vec<usize> = discover_takes(dir, names)
        .await?
        .into_iter()
        .filter(|&index| index >= takes)
        .collect();
    if !stray.is_empty() {
        return Err(WorkerError::UnexpectedTakes {
            configured: takes,
            found: stray,
        });
    }

    Ok((0..takes).rev().map(|i| dir.join(names.take(i))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvgen_media::analysis::DownbeatWindow;
    use mvgen_media::{ClipPool, Pacing, SchedulerConfig};
    use mvgen_models::{ClipHandle, IntensityLevel, SchedulingMode};
    use std::sync::Mutex;

    /// Writes the cut count into the output file.
    #[derive(Default)]
    struct FakeRenderer {
        rendered: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl TakeRenderer for FakeRenderer {
        async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<(), BoxError> {
            tokio::fs::write(output, format!("{} cuts", plan.len())).await?;
            self.rendered.lock().unwrap().push(plan.take_index);
            Ok(())
        }
    }

    fn generator(seed: Option<u64>) -> TakeGenerator {
        let footage = ClipPool::new(vec![
            ClipHandle::new("a", "a.mp4", 20.0),
            ClipHandle::new("b", "b.mp4", 35.0),
        ]);
        let titles = ClipPool::new(vec![ClipHandle::new("t", "t.mp4", 30.0)]);
        let mut config = SchedulerConfig::default();
        config.seed = seed;
        let scheduler = BeatScheduler::new(
            Arc::new(footage),
            Arc::new(titles),
            Pacing::from_mode(
                SchedulingMode::Smart,
                &[IntensityLevel::Low, IntensityLevel::High, IntensityLevel::Medium],
            ),
            config,
        );
        TakeGenerator::new(Arc::new(scheduler))
    }

    fn timing() -> SongTiming {
        SongTiming {
            window: DownbeatWindow::new(2.0, 26.0),
            duration: 30.0,
            bpm: 120.0,
        }
    }

    fn request(takes: usize) -> TakeRequest {
        TakeRequest::all(timing(), takes, ArtifactNames::new("song"))
    }

    #[test]
    fn test_schedule_all_in_take_order() {
        let plans = generator(Some(1)).schedule_all(&request(4)).unwrap();
        let indices: Vec<_> = plans.iter().map(|p| p.take_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(plans[2].artifact, "song_subVid2.mp4");
        assert!(plans.iter().all(|p| p.main_loop_beats() == 48));
    }

    #[test]
    fn test_seeded_schedule_is_reproducible() {
        let a = generator(Some(7)).schedule_all(&request(3)).unwrap();
        let b = generator(Some(7)).schedule_all(&request(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_subset_matches_full_schedule() {
        let generator = generator(Some(7));
        let full = generator.schedule_all(&request(3)).unwrap();

        let mut subset = request(3);
        subset.indices = vec![1];
        let partial = generator.schedule_all(&subset).unwrap();

        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0], full[1]);
    }

    #[test]
    fn test_one_failed_take_fails_all() {
        let scheduler = BeatScheduler::new(
            Arc::new(ClipPool::default()),
            Arc::new(ClipPool::default()),
            Pacing::Uniform,
            SchedulerConfig::default(),
        );
        let result = TakeGenerator::new(Arc::new(scheduler)).schedule_all(&request(3));
        assert!(matches!(result, Err(WorkerError::Media(_))));
    }

    #[tokio::test]
    async fn test_render_all_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(Some(3));
        let plans = generator.schedule_all(&request(3)).unwrap();

        tokio::fs::write(dir.path().join("song_subVid1.mp4"), b"old")
            .await
            .unwrap();

        let renderer = Arc::new(FakeRenderer::default());
        let outputs = generator
            .render_all(&plans, dir.path(), renderer.clone())
            .await
            .unwrap();

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[1], dir.path().join("song_subVid1.mp4"));
        let mut rendered = renderer.rendered.lock().unwrap().clone();
        rendered.sort_unstable();
        assert_eq!(rendered, vec![0, 2]);

        assert!(generator
            .pending(dir.path(), &ArtifactNames::new("song"), 3)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_pending_lists_every_missing_take() {
        let dir = tempfile::tempdir().unwrap();
        let names = ArtifactNames::new("song");
        tokio::fs::write(dir.path().join("song_subVid2.mp4"), b"done")
            .await
            .unwrap();

        let pending = generator(None).pending(dir.path(), &names, 3).await;
        assert_eq!(pending, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_render_all_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = watch::channel(false);
        let generator = generator(Some(4)).with_cancel(rx);
        let plans = generator.schedule_all(&request(2)).unwrap();
        tx.send(true).unwrap();

        let renderer = Arc::new(FakeRenderer::default());
        let result = generator.render_all(&plans, dir.path(), renderer.clone()).await;

        assert!(matches!(result, Err(WorkerError::Cancelled)));
        assert!(renderer.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_takes_highest_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "song_subVid0.mp4",
            "song_subVid10.mp4",
            "song_subVid2.mp4",
            "song_blended0.mp4",
            "other_subVid5.mp4",
            "song_subVid1.plan.json",
        ] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let takes = discover_takes(dir.path(), &ArtifactNames::new("song"))
            .await
            .unwrap();
        assert_eq!(takes, vec![10, 2, 0]);
    }

    #[tokio::test]
    async fn test_take_leaves_follow_configured_count() {
        let dir = tempfile::tempdir().unwrap();
        let names = ArtifactNames::new("song");
        tokio::fs::write(dir.path().join("song_subVid1.mp4"), b"x")
            .await
            .unwrap();

        let leaves = take_leaves(dir.path(), &names, 3).await.unwrap();
        assert_eq!(
            leaves,
            vec![
                dir.path().join("song_subVid2.mp4"),
                dir.path().join("song_subVid1.mp4"),
                dir.path().join("song_subVid0.mp4"),
            ]
        );
    }

    #[tokio::test]
    async fn test_take_leaves_reject_stray_takes() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("song_subVid7.mp4"), b"x")
            .await
            .unwrap();

        let result = take_leaves(dir.path(), &ArtifactNames::new("song"), 3).await;
        assert!(matches!(
            result,
            Err(WorkerError::UnexpectedTakes { configured: 3, ref found }) if found == &vec![7]
        ));
    }

    #[tokio::test]
    async fn test_discover_takes_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let takes = discover_takes(&dir.path().join("absent"), &ArtifactNames::new("song"))
            .await
            .unwrap();
        assert!(takes.is_empty());
    }
}
