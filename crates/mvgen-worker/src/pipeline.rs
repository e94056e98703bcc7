//! End-to-end run over one project.
//!
//! ```text
//! music/{song}.f32 ──► analysis ──► schedule takes ──► render ──► reduce ──► finishing plan
//!                         │               │                         │
//!                  intensities.json   subVid{i}.plan.json     reduction.json
//! ```
//!
//! [`Pipeline::plan`] writes every plan to disk and leaves rendering and
//! blending to external tools. [`Pipeline::run_with`] executes the whole
//! chain through injected collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mvgen_media::analysis::{
    analyze_structure, estimate_bpm, AnalysisError, Track, TrackStructure,
};
use mvgen_media::composite::{
    ArtifactProbe, BlendExecutor, CompositeGraph, CompositeReducer, FsArtifactProbe,
};
use mvgen_media::{plan_finishing, BeatScheduler, ClipPool, FinishingPaths, Pacing};
use mvgen_models::{ArtifactNames, FinishingPlan, RenderPlan};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::manifest::ClipManifest;
use crate::pcm::load_pcm_f32le;
use crate::takes::{take_leaves, TakeGenerator, TakeRenderer, TakeRequest};

/// Files written by [`Pipeline::plan`].
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub render_plans: Vec<PathBuf>,
    pub intensities: PathBuf,
    /// `None` while any configured take is still unrendered.
    pub reduction: Option<PathBuf>,
    pub finishing: Option<PathBuf>,
}

/// Result of [`Pipeline::run_with`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub takes: Vec<PathBuf>,
    pub composite: PathBuf,
    pub blends_executed: usize,
    pub finishing: FinishingPlan,
}

/// Analyzed song plus a scheduler ready to use.
struct Prepared {
    track: Track,
    structure: TrackStructure,
    generator: TakeGenerator,
}

pub struct Pipeline {
    config: WorkerConfig,
    names: ArtifactNames,
    probe: Arc<dyn ArtifactProbe>,
    cancel: Option<watch::Receiver<bool>>,
    logger: RunLogger,
}

impl Pipeline {
    pub fn new(config: WorkerConfig) -> Self {
        let names = ArtifactNames::new(config.song.clone());
        let logger = RunLogger::for_config(&config);
        Self {
            config,
            names,
            probe: Arc::new(FsArtifactProbe),
            cancel: None,
            logger,
        }
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ArtifactProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    /// Analyze, schedule and write all plans without rendering anything.
    pub async fn plan(&self) -> WorkerResult<PlanOutcome> {
        let span = self.logger.create_span("plan");
        self.plan_inner().instrument(span).await
    }

    async fn plan_inner(&self) -> WorkerResult<PlanOutcome> {
        self.logger.log_start("plan");
        let temp_dir = self.config.temp_dir();
        tokio::fs::create_dir_all(&temp_dir).await?;

        let takes = take_leaves(&temp_dir, &self.names, self.config.takes).await?;
        let prepared = self.prepare().await?;
        let intensities = self.write_intensities(&prepared.structure, &temp_dir).await?;

        let pending = prepared
            .generator
            .pending(&temp_dir, &self.names, self.config.takes)
            .await;

        if !pending.is_empty() {
            let plans = self.schedule(&prepared, pending).await?;
            let mut render_plans = Vec::with_capacity(plans.len());
            for plan in &plans {
                let path = temp_dir.join(self.names.take_plan(plan.take_index));
                write_json(&path, plan).await?;
                render_plans.push(path);
            }

            // The reduction needs every configured take
            self.logger.log_completion(&format!(
                "wrote {} render plans for {} takes, reduction not planned",
                render_plans.len(),
                takes.len()
            ));
            return Ok(PlanOutcome {
                render_plans,
                intensities,
                reduction: None,
                finishing: None,
            });
        }
        self.logger.log_progress("all takes already rendered, skipping scheduling");

        let reduction = CompositeGraph::build(&takes, &self.names, &temp_dir)?
            .plan(self.probe.as_ref())
            .await?;
        let reduction_path = temp_dir.join(self.names.reduction_plan());
        write_json(&reduction_path, &reduction).await?;

        let finishing = self
            .finishing(&reduction.final_artifact, &prepared.track)
            .await;
        let finishing_path = temp_dir.join(self.names.finishing_plan());
        write_json(&finishing_path, &finishing).await?;

        self.logger.log_completion(&format!(
            "{} takes, {} blends pending, {} finishing steps",
            takes.len(),
            reduction.step_count(),
            finishing.steps.len()
        ));

        Ok(PlanOutcome {
            render_plans: Vec::new(),
            intensities,
            reduction: Some(reduction_path),
            finishing: Some(finishing_path),
        })
    }

    /// Run the whole chain with the given renderer and blender.
    pub async fn run_with(
        &self,
        renderer: Arc<dyn TakeRenderer>,
        blender: Arc<dyn BlendExecutor>,
    ) -> WorkerResult<RunOutcome> {
        let span = self.logger.create_span("render");
        self.run_inner(renderer, blender).instrument(span).await
    }

    async fn run_inner(
        &self,
        renderer: Arc<dyn TakeRenderer>,
        blender: Arc<dyn BlendExecutor>,
    ) -> WorkerResult<RunOutcome> {
        self.logger.log_start("render");
        let temp_dir = self.config.temp_dir();
        tokio::fs::create_dir_all(&temp_dir).await?;
        tokio::fs::create_dir_all(self.config.out_dir()).await?;

        let takes = take_leaves(&temp_dir, &self.names, self.config.takes).await?;
        let prepared = self.prepare().await?;
        self.write_intensities(&prepared.structure, &temp_dir).await?;

        let pending = prepared
            .generator
            .pending(&temp_dir, &self.names, self.config.takes)
            .await;
        if pending.is_empty() {
            self.logger.log_progress("all takes already rendered");
        } else {
            let plans = self.schedule(&prepared, pending).await?;
            prepared
                .generator
                .render_all(&plans, &temp_dir, renderer)
                .await?;
            self.logger.log_progress(&format!("rendered {} takes", plans.len()));
        }

        let mut reducer = CompositeReducer::new(blender)
            .with_probe(self.probe.clone())
            .with_max_parallel(self.config.max_blend_parallel);
        if let Some(cancel) = &self.cancel {
            reducer = reducer.with_cancel(cancel.clone());
        }
        let outcome = reducer.reduce(&takes, &self.names, &temp_dir).await?;

        let finishing = self
            .finishing(&outcome.final_artifact, &prepared.track)
            .await;
        write_json(&temp_dir.join(self.names.finishing_plan()), &finishing).await?;

        self.logger.log_completion(&format!(
            "composite {} ({} blends)",
            outcome.final_artifact.display(),
            outcome.executed
        ));

        Ok(RunOutcome {
            takes,
            composite: outcome.final_artifact,
            blends_executed: outcome.executed,
            finishing,
        })
    }

    /// Load the track and clips, analyze the song and build the scheduler.
    async fn prepare(&self) -> WorkerResult<Prepared> {
        let samples = load_pcm_f32le(&self.config.music_path()).await?;
        if samples.is_empty() {
            return Err(AnalysisError::EmptyWaveform.into());
        }

        let bpm = match self.config.bpm {
            Some(bpm) => bpm,
            None => {
                let bpm = estimate_bpm(&samples, self.config.sample_rate)?;
                self.logger.log_progress(&format!("estimated tempo {} BPM", bpm));
                bpm
            }
        };

        let path = self.config.music_path();
        let track = match self.config.duration {
            Some(duration) => Track::new(&path, samples, self.config.sample_rate, duration, bpm)?,
            None => Track::from_samples(&path, samples, self.config.sample_rate, bpm)?,
        };

        let structure = analyze_structure(&track, self.config.mode)?;
        if structure.segments.is_empty() {
            self.logger
                .log_warning("no complete section in the downbeat window");
        }

        let manifest = ClipManifest::load(&self.config.manifest_path()).await?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let footage = ClipPool::preload(manifest.footage, self.config.resolution, &mut rng);
        let titles = ClipPool::new(manifest.titles);

        let scheduler = BeatScheduler::new(
            Arc::new(footage),
            Arc::new(titles),
            Pacing::from_mode(self.config.mode, &structure.levels()),
            self.config.scheduler_config(),
        );

        let mut generator = TakeGenerator::new(Arc::new(scheduler))
            .with_probe(self.probe.clone())
            .with_max_render_parallel(self.config.max_render_parallel);
        if let Some(cancel) = &self.cancel {
            generator = generator.with_cancel(cancel.clone());
        }

        Ok(Prepared {
            track,
            structure,
            generator,
        })
    }

    /// Schedule `indices` on the blocking pool so rayon does not stall the runtime.
    async fn schedule(
        &self,
        prepared: &Prepared,
        indices: Vec<usize>,
    ) -> WorkerResult<Vec<RenderPlan>> {
        let generator = prepared.generator.clone();
        let request = TakeRequest {
            timing: prepared.structure.timing(),
            indices,
            names: self.names.clone(),
        };

        tokio::task::spawn_blocking(move || generator.schedule_all(&request))
            .await
            .map_err(|e| WorkerError::internal(format!("scheduling task failed: {}", e)))?
    }

    async fn write_intensities(
        &self,
        structure: &TrackStructure,
        temp_dir: &Path,
    ) -> WorkerResult<PathBuf> {
        let path = temp_dir.join(self.names.intensities());
        write_json(&path, &structure.report()).await?;
        Ok(path)
    }

    async fn finishing(&self, composite: &Path, track: &Track) -> FinishingPlan {
        let paths = FinishingPaths::new(
            composite,
            &self.names,
            &self.config.temp_dir(),
            &self.config.out_dir(),
            track.path(),
        );
        plan_finishing(&paths, self.probe.as_ref()).await
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> WorkerResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
