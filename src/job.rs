// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Progress tracking for table build runs.
//!
//! A [`JobTracker`] is owned by whoever starts the build and handed to the
//! builder by reference. Clones share state, so a status endpoint or another
//! thread can poll [`JobTracker::snapshot`] while the build is running.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle of a build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Finished,
}

/// Outcome of one processed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearOutcome {
    Built,
    Skipped,
    Failed,
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    /// `None` until the job finishes.
    pub ok: Option<bool>,
    pub error: Option<String>,
    pub total: usize,
    pub processed: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
    pub current_year: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Idle,
            ok: None,
            error: None,
            total: 0,
            processed: 0,
            built: 0,
            skipped: 0,
            failed: 0,
            current_year: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Shared, mutex-guarded job status.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    status: Arc<Mutex<JobStatus>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset counters and enter `Running`.
    pub fn begin(&self, total: usize) {
        *self.status.lock() = JobStatus {
            state: JobState::Running,
            total,
            started_at: Some(Utc::now()),
            ..JobStatus::default()
        };
    }

    /// Mark `year` as the one currently being processed.
    pub fn start_year(&self, year: i32) {
        self.status.lock().current_year = Some(year);
    }

    pub fn record_year(&self, year: i32, outcome: YearOutcome) {
        let mut status = self.status.lock();
        status.processed += 1;
        match outcome {
            YearOutcome::Built => status.built += 1,
            YearOutcome::Skipped => status.skipped += 1,
            YearOutcome::Failed => status.failed += 1,
        }
        if status.current_year == Some(year) {
            status.current_year = None;
        }
    }

    /// Enter `Finished`. `error` is kept only for failed jobs.
    pub fn finish(&self, ok: bool, error: Option<String>) {
        let mut status = self.status.lock();
        status.state = JobState::Finished;
        status.ok = Some(ok);
        status.error = if ok { None } else { error };
        status.current_year = None;
        status.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobStatus {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.lock().state == JobState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_is_idle() {
        let status = JobTracker::new().snapshot();
        assert_eq!(status.state, JobState::Idle);
        assert_eq!(status.ok, None);
        assert!(status.started_at.is_none());
    }

    #[test]
    fn counts_outcomes() {
        let tracker = JobTracker::new();
        tracker.begin(3);
        assert!(tracker.is_running());
        tracker.start_year(2000);
        tracker.record_year(2000, YearOutcome::Built);
        tracker.record_year(2001, YearOutcome::Skipped);
        tracker.record_year(2002, YearOutcome::Failed);
        tracker.finish(false, Some("1 year failed".into()));

        let status = tracker.snapshot();
        assert_eq!(status.state, JobState::Finished);
        assert_eq!((status.processed, status.built, status.skipped, status.failed), (3, 1, 1, 1));
        assert_eq!(status.ok, Some(false));
        assert_eq!(status.error.as_deref(), Some("1 year failed"));
        assert!(status.finished_at >= status.started_at);
    }

    #[test]
    fn clones_share_state() {
        let tracker = JobTracker::new();
        let observer = tracker.clone();
        tracker.begin(1);
        assert_eq!(observer.snapshot().state, JobState::Running);
    }

    #[test]
    fn begin_resets_previous_run() {
        let tracker = JobTracker::new();
        tracker.begin(1);
        tracker.record_year(1999, YearOutcome::Failed);
        tracker.finish(false, Some("boom".into()));
        tracker.begin(2);
        let status = tracker.snapshot();
        assert_eq!(status.failed, 0);
        assert_eq!(status.error, None);
        assert_eq!(status.total, 2);
    }

    #[test]
    fn status_serializes_lowercase_state() {
        let tracker = JobTracker::new();
        tracker.begin(0);
        tracker.finish(true, None);
        let json = serde_json::to_string(&tracker.snapshot()).unwrap();
        assert!(json.contains("\"state\":\"finished\""), "{json}");
        assert!(json.contains("\"ok\":true"));
    }
}
