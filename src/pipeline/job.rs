// src/pipeline/job.rs
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::ShelfScanError;

/// Lifecycle of one style enhancement. The generated image lives inside
/// `Completed`, so no other state can carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Pending,
    Processing,
    Completed { image: Bytes },
    Error,
}

/// Tag-only view of [`JobState`] for API responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Idle => JobStatus::Idle,
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Error => JobStatus::Error,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed { .. } => "completed",
            JobState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleJob {
    pub style_id: &'static str,
    state: JobState,
}

impl StyleJob {
    pub fn new(style_id: &'static str, automatic: bool) -> Self {
        let state = if automatic { JobState::Pending } else { JobState::Idle };
        Self { style_id, state }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn image(&self) -> Option<&Bytes> {
        match &self.state {
            JobState::Completed { image } => Some(image),
            _ => None,
        }
    }

    /// `pending -> processing`, once, when the automatic batch launches.
    pub fn launch(&mut self) -> Result<(), ShelfScanError> {
        match self.state {
            JobState::Pending => self.move_to(JobState::Processing),
            _ => Err(self.illegal("launch")),
        }
    }

    /// `idle | error -> processing` on user request.
    pub fn begin(&mut self) -> Result<(), ShelfScanError> {
        match self.state {
            JobState::Idle | JobState::Error => self.move_to(JobState::Processing),
            _ => Err(self.illegal("start")),
        }
    }

    pub fn complete(&mut self, image: Bytes) -> Result<(), ShelfScanError> {
        match self.state {
            JobState::Processing => self.move_to(JobState::Completed { image }),
            _ => Err(self.illegal("complete")),
        }
    }

    pub fn fail(&mut self) -> Result<(), ShelfScanError> {
        match self.state {
            JobState::Processing => self.move_to(JobState::Error),
            _ => Err(self.illegal("fail")),
        }
    }

    fn move_to(&mut self, next: JobState) -> Result<(), ShelfScanError> {
        self.state = next;
        Ok(())
    }

    fn illegal(&self, action: &'static str) -> ShelfScanError {
        ShelfScanError::InvalidTransition {
            style_id: self.style_id.to_string(),
            from: self.state.name(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_jobs_start_pending_manual_idle() {
        assert_eq!(StyleJob::new("moody_macro", true).status(), JobStatus::Pending);
        assert_eq!(StyleJob::new("fine_dining", false).status(), JobStatus::Idle);
    }

    #[test]
    fn automatic_path_runs_once() {
        let mut job = StyleJob::new("surprise", true);
        job.launch().unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.launch().is_err());
        job.complete(Bytes::from_static(b"png")).unwrap();
        assert_eq!(job.image(), Some(&Bytes::from_static(b"png")));
        assert!(job.launch().is_err());
    }

    #[test]
    fn manual_jobs_can_retry_after_error() {
        let mut job = StyleJob::new("high_key", false);
        assert!(job.launch().is_err());
        job.begin().unwrap();
        job.fail().unwrap();
        assert_eq!(job.status(), JobStatus::Error);
        assert!(job.image().is_none());

        job.begin().unwrap();
        job.fail().unwrap();
        job.begin().unwrap();
        job.complete(Bytes::from_static(b"img")).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn illegal_transitions_leave_state_untouched() {
        let mut job = StyleJob::new("menu_look", false);
        assert!(job.complete(Bytes::new()).is_err());
        assert!(job.fail().is_err());
        assert_eq!(job.status(), JobStatus::Idle);

        job.begin().unwrap();
        let err = job.begin().unwrap_err();
        assert!(matches!(
            err,
            ShelfScanError::InvalidTransition { from: "processing", action: "start", .. }
        ));

        job.complete(Bytes::from_static(b"x")).unwrap();
        assert!(job.begin().is_err());
        assert!(job.fail().is_err());
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn image_present_only_when_completed() {
        let mut job = StyleJob::new("lux_dark", false);
        for step in 0..3 {
            assert!(job.image().is_none(), "step {step}");
            match step {
                0 => job.begin().unwrap(),
                1 => job.fail().unwrap(),
                _ => job.begin().unwrap(),
            }
        }
        job.complete(Bytes::from_static(b"done")).unwrap();
        assert!(job.image().is_some());
    }
}
