//! Executes a reduction plan level by level.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use mvgen_models::{ArtifactNames, BlendStep, ReductionPlan};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use super::graph::CompositeGraph;
use super::probe::{ArtifactProbe, FsArtifactProbe};
use super::{BoxError, ReductionError, ReductionResult};
use crate::metrics;

/// Produces one blend artifact. Implemented by the encoder integration.
#[async_trait]
pub trait BlendExecutor: Send + Sync {
    async fn blend(&self, step: &BlendStep) -> Result<(), BoxError>;
}

/// Result of a reduction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionOutcome {
    pub final_artifact: PathBuf,
    /// Blends performed in this run.
    pub executed: usize,
    /// Existing blend artifacts that were reused.
    pub skipped: usize,
}

/// Folds N takes into one composite through pairwise blends.
pub struct CompositeReducer {
    blender: Arc<dyn BlendExecutor>,
    probe: Arc<dyn ArtifactProbe>,
    max_parallel: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl CompositeReducer {
    pub fn new(blender: Arc<dyn BlendExecutor>) -> Self {
        Self {
            blender,
            probe: Arc::new(FsArtifactProbe),
            max_parallel: 2,
            cancel: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ArtifactProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Blends of one level running at the same time (at least 1).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Stop between blends once the receiver reads `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Plan without executing anything.
    pub async fn plan(
        &self,
        takes: &[PathBuf],
        names: &ArtifactNames,
        dir: &Path,
    ) -> ReductionResult<ReductionPlan> {
        let graph = CompositeGraph::build(takes, names, dir)?;
        graph.plan(self.probe.as_ref()).await
    }

    /// Produce the composite of `takes`, reusing any blend already on disk.
    pub async fn reduce(
        &self,
        takes: &[PathBuf],
        names: &ArtifactNames,
        dir: &Path,
    ) -> ReductionResult<ReductionOutcome> {
        let started = Instant::now();
        let plan = self.plan(takes, names, dir).await?;
        metrics::record_blends_skipped(plan.skipped.len());

        info!(
            takes = takes.len(),
            blends = plan.step_count(),
            reused = plan.skipped.len(),
            "Starting reduction"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut executed = 0usize;

        for steps in &plan.levels {
            self.check_cancelled()?;

            let futures: Vec<_> = steps
                .iter()
                .map(|step| {
                    let semaphore = semaphore.clone();
                    async move {
                        let _permit = semaphore
                            .acquire()
                            .await
                            .map_err(|_| ReductionError::Cancelled)?;
                        self.check_cancelled()?;
                        self.run_step(step).await
                    }
                })
                .collect();

            // A level is done only when every blend in it is
            let results = join_all(futures).await;
            for result in results {
                result?;
                executed += 1;
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        metrics::record_reduction_duration(takes.len(), elapsed);

        info!(
            final_artifact = %plan.final_artifact.display(),
            executed = executed,
            duration_secs = elapsed,
            "Reduction complete"
        );

        Ok(ReductionOutcome {
            final_artifact: plan.final_artifact,
            executed,
            skipped: plan.skipped.len(),
        })
    }

    async fn run_step(&self, step: &BlendStep) -> ReductionResult<()> {
        debug!(
            level = step.level,
            index = step.index,
            output = %step.output.display(),
            "Blending"
        );

        self.blender
            .blend(step)
            .await
            .map_err(|source| ReductionError::blend_failed(&step.output, source))?;

        if !self.probe.exists(&step.output).await {
            warn!(output = %step.output.display(), "Blend reported success but wrote nothing");
            return Err(ReductionError::MissingArtifact(step.output.clone()));
        }

        metrics::record_blend_executed(step.level);
        Ok(())
    }

    fn check_cancelled(&self) -> ReductionResult<()> {
        match &self.cancel {
            Some(rx) if *rx.borrow() => Err(ReductionError::Cancelled),
            _ => Ok(()),
        }
    }
}
