//! Structured run logging.
//!
//! Every pipeline run gets a run id so interleaved logs from concurrent
//! takes and blends can be grouped. The song, pacing mode and configured take
//! count ride along on every event.

use mvgen_models::SchedulingMode;
use tracing::{error, info, warn, Span};
use uuid::Uuid;

use crate::config::WorkerConfig;

/// Logger bound to one montage run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    song: String,
    mode: SchedulingMode,
    takes: usize,
}

impl RunLogger {
    /// Create a logger with a fresh run id.
    pub fn new(song: impl Into<String>, mode: SchedulingMode, takes: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            song: song.into(),
            mode,
            takes,
        }
    }

    pub fn for_config(config: &WorkerConfig) -> Self {
        Self::new(config.song.clone(), config.mode, config.takes)
    }

    pub fn log_start(&self, stage: &str) {
        info!(
            run_id = %self.run_id,
            song = %self.song,
            mode = self.mode.as_str(),
            takes = self.takes,
            "Run started: {}", stage
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, song = %self.song, "Run progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, song = %self.song, "Run warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            song = %self.song,
            mode = self.mode.as_str(),
            "Run failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, song = %self.song, "Run completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn song(&self) -> &str {
        &self.song
    }

    /// Span covering one stage (`plan` or `render`) of this run.
    pub fn create_span(&self, stage: &'static str) -> Span {
        tracing::info_span!(
            "montage",
            run_id = %self.run_id,
            song = %self.song,
            mode = self.mode.as_str(),
            takes = self.takes,
            stage = stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_run_gets_its_own_id() {
        let a = RunLogger::new("song", SchedulingMode::Smart, 3);
        let b = RunLogger::new("song", SchedulingMode::Smart, 3);

        assert!(Uuid::parse_str(a.run_id()).is_ok());
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn test_for_config_carries_song() {
        let config = WorkerConfig {
            song: "Brest2008".to_string(),
            takes: 5,
            ..Default::default()
        };
        let logger = RunLogger::for_config(&config);
        assert_eq!(logger.song(), "Brest2008");
        assert_eq!(logger.takes, 5);
    }
}
