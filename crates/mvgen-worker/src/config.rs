//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;

use mvgen_media::SchedulerConfig;
use mvgen_models::SchedulingMode;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Project root holding `music/`, `clips.json`, `temp/` and `out/`
    pub project_dir: PathBuf,
    /// Song name; the track is read from `music/{song}.f32`
    pub song: String,
    /// Known tempo. Estimated from the waveform when absent
    pub bpm: Option<f64>,
    /// Sample rate of the raw PCM file
    pub sample_rate: u32,
    /// Container duration in seconds. Derived from the sample count when absent
    pub duration: Option<f64>,
    /// Number of takes to schedule and blend
    pub takes: usize,
    /// Pacing policy
    pub mode: SchedulingMode,
    /// Target vertical resolution; larger footage is dropped
    pub resolution: u32,
    /// Maximum takes rendered at once
    pub max_render_parallel: usize,
    /// Maximum blends of one level running at once
    pub max_blend_parallel: usize,
    /// Clip draw budget per cut
    pub max_clip_attempts: u32,
    /// Base seed for reproducible runs
    pub seed: Option<u64>,
    /// Dump Prometheus metrics to `temp/metrics.prom` after the run
    pub write_metrics: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            song: String::new(),
            bpm: None,
            sample_rate: 44_100,
            duration: None,
            takes: 3,
            mode: SchedulingMode::Smart,
            resolution: 1080,
            max_render_parallel: 6,
            max_blend_parallel: 2,
            max_clip_attempts: 64,
            seed: None,
            write_metrics: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup (environment, tests).
    pub fn from_lookup<F>(get: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let song = get("MVGEN_SONG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WorkerError::config_error("MVGEN_SONG is required"))?;

        let mode = match get("MVGEN_MODE") {
            Some(raw) => raw
                .parse::<SchedulingMode>()
                .map_err(|e| WorkerError::config_error(e.to_string()))?,
            None => defaults.mode,
        };

        let takes = parse_var(&get, "MVGEN_TAKES").unwrap_or(defaults.takes);
        if takes == 0 {
            return Err(WorkerError::config_error("MVGEN_TAKES must be at least 1"));
        }

        Ok(Self {
            project_dir: get("MVGEN_PROJECT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.project_dir),
            song,
            bpm: parse_var(&get, "MVGEN_BPM").filter(|b: &f64| *b > 0.0),
            sample_rate: parse_var(&get, "MVGEN_SAMPLE_RATE").unwrap_or(defaults.sample_rate),
            duration: parse_var(&get, "MVGEN_DURATION").filter(|d: &f64| *d > 0.0),
            takes,
            mode,
            resolution: parse_var(&get, "MVGEN_RESOLUTION").unwrap_or(defaults.resolution),
            max_render_parallel: parse_var(&get, "MVGEN_MAX_RENDER_PARALLEL")
                .unwrap_or(defaults.max_render_parallel),
            max_blend_parallel: parse_var(&get, "MVGEN_MAX_BLEND_PARALLEL")
                .unwrap_or(defaults.max_blend_parallel),
            max_clip_attempts: parse_var(&get, "MVGEN_MAX_CLIP_ATTEMPTS")
                .unwrap_or(defaults.max_clip_attempts),
            seed: parse_var(&get, "MVGEN_SEED"),
            write_metrics: get("MVGEN_WRITE_METRICS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Raw PCM input.
    pub fn music_path(&self) -> PathBuf {
        self.project_dir.join("music").join(format!("{}.f32", self.song))
    }

    /// Clip manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join("clips.json")
    }

    /// Takes, intermediates and plan files.
    pub fn temp_dir(&self) -> PathBuf {
        self.project_dir.join("temp")
    }

    /// Deliverables.
    pub fn out_dir(&self) -> PathBuf {
        self.project_dir.join("out")
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        let config = SchedulerConfig::default().with_max_clip_attempts(self.max_clip_attempts);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn parse_var<T, F>(get: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    get(key).and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[("MVGEN_SONG", "track")])).unwrap();
        assert_eq!(config.song, "track");
        assert_eq!(config.takes, 3);
        assert_eq!(config.mode, SchedulingMode::Smart);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.max_render_parallel, 6);
        assert_eq!(config.max_blend_parallel, 2);
        assert!(config.bpm.is_none());
        assert!(!config.write_metrics);
        assert_eq!(config.music_path(), PathBuf::from("./music/track.f32"));
    }

    #[test]
    fn test_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("MVGEN_SONG", "track"),
            ("MVGEN_PROJECT_DIR", "/data/proj"),
            ("MVGEN_BPM", "128"),
            ("MVGEN_TAKES", "5"),
            ("MVGEN_MODE", "simple_vid"),
            ("MVGEN_SEED", "42"),
            ("MVGEN_MAX_CLIP_ATTEMPTS", "16"),
            ("MVGEN_WRITE_METRICS", "1"),
        ]))
        .unwrap();

        assert_eq!(config.bpm, Some(128.0));
        assert_eq!(config.takes, 5);
        assert_eq!(config.mode, SchedulingMode::Simple);
        assert!(config.write_metrics);
        assert_eq!(config.temp_dir(), PathBuf::from("/data/proj/temp"));

        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.max_clip_attempts, 16);
        assert_eq!(scheduler.seed, Some(42));
    }

    #[test]
    fn test_missing_song_and_bad_mode() {
        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[])),
            Err(WorkerError::ConfigError(_))
        ));
        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[("MVGEN_SONG", "a"), ("MVGEN_MODE", "chaotic")])),
            Err(WorkerError::ConfigError(_))
        ));
        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[("MVGEN_SONG", "a"), ("MVGEN_TAKES", "0")])),
            Err(WorkerError::ConfigError(_))
        ));
    }
}
