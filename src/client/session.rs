// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-side patrol session.
//!
//! Holds the tanod's buffered patrol logs in a JSON file so they survive
//! restarts, and sequences the start/end patrol calls. Ending a patrol runs
//! three steps: mark the schedule `Ended`, clear the tracking marker, flush
//! the logs. Once the schedule is ended the remaining steps are always
//! attempted. A flush failure keeps the logs buffered for the next attempt.

use super::api::ApiClient;
use super::error::ClientError;
use super::realtime::RealtimeClient;
use crate::geometry::LatLng;
use crate::models::{PatrolLogEntry, PatrolSchedule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// The patrol calls a session makes.
pub trait PatrolApi {
    fn start_patrol(
        &self,
        schedule_id: &str,
        location: LatLng,
    ) -> impl Future<Output = Result<PatrolSchedule, ClientError>> + Send;

    fn end_patrol(
        &self,
        schedule_id: &str,
    ) -> impl Future<Output = Result<PatrolSchedule, ClientError>> + Send;

    fn clear_patrol_status(
        &self,
        ended_patrol_id: &str,
    ) -> impl Future<Output = Result<bool, ClientError>> + Send;

    fn save_patrol_logs(
        &self,
        schedule_id: &str,
        logs: &[PatrolLogEntry],
    ) -> impl Future<Output = Result<usize, ClientError>> + Send;
}

impl PatrolApi for ApiClient {
    async fn start_patrol(
        &self,
        schedule_id: &str,
        location: LatLng,
    ) -> Result<PatrolSchedule, ClientError> {
        ApiClient::start_patrol(self, schedule_id, location).await
    }

    async fn end_patrol(&self, schedule_id: &str) -> Result<PatrolSchedule, ClientError> {
        ApiClient::end_patrol(self, schedule_id).await
    }

    async fn clear_patrol_status(&self, ended_patrol_id: &str) -> Result<bool, ClientError> {
        ApiClient::clear_patrol_status(self, ended_patrol_id).await
    }

    async fn save_patrol_logs(
        &self,
        schedule_id: &str,
        logs: &[PatrolLogEntry],
    ) -> Result<usize, ClientError> {
        ApiClient::save_patrol_logs(self, schedule_id, logs).await
    }
}

/// On-disk shape of the log buffer.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogBuffer {
    #[serde(default)]
    patrol_logs: BTreeMap<String, Vec<PatrolLogEntry>>,
}

/// Result of ending a patrol.
#[derive(Debug)]
pub struct EndPatrolOutcome {
    pub schedule: PatrolSchedule,
    /// Whether the tracking marker pointed at this patrol and was cleared
    pub location_cleared: bool,
    pub logs_flushed: usize,
    /// Logs still buffered because the flush failed
    pub logs_pending: usize,
    /// User-facing warnings for steps that failed after the patrol ended
    pub warnings: Vec<String>,
}

pub struct PatrolSession {
    tanod_id: String,
    path: PathBuf,
    buffer: LogBuffer,
}

impl PatrolSession {
    /// Open a session, loading any logs buffered by a previous run.
    pub fn load(tanod_id: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let buffer = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LogBuffer::default(),
            Err(e) => return Err(e.into()),
        };

        let session = Self {
            tanod_id: tanod_id.into(),
            path,
            buffer,
        };
        tracing::debug!(
            tanod_id = %session.tanod_id,
            schedules = session.buffer.patrol_logs.len(),
            "Patrol session loaded"
        );
        Ok(session)
    }

    pub fn tanod_id(&self) -> &str {
        &self.tanod_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the log buffer to disk.
    pub fn persist(&self) -> Result<(), ClientError> {
        let bytes = serde_json::to_vec_pretty(&self.buffer)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Buffer a patrol report for later flush.
    pub fn record_log(
        &mut self,
        schedule_id: &str,
        report: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        self.buffer
            .patrol_logs
            .entry(schedule_id.to_string())
            .or_default()
            .push(PatrolLogEntry {
                timestamp: now,
                report: report.into(),
            });
        self.persist()
    }

    pub fn pending_logs(&self, schedule_id: &str) -> &[PatrolLogEntry] {
        self.buffer
            .patrol_logs
            .get(schedule_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Start a patrol, then reconnect the realtime channel so it carries
    /// this patrol's session.
    pub async fn start_patrol<A: PatrolApi>(
        &self,
        api: &A,
        schedule_id: &str,
        location: LatLng,
        realtime: Option<&RealtimeClient>,
    ) -> Result<PatrolSchedule, ClientError> {
        let schedule = api.start_patrol(schedule_id, location).await?;
        tracing::info!(tanod_id = %self.tanod_id, schedule_id, "Patrol started");

        if let Some(realtime) = realtime {
            realtime.reconnect();
        }
        Ok(schedule)
    }

    /// End a patrol: mark it ended, clear tracking, flush logs.
    ///
    /// Only a failure to end the schedule is returned. After that, a failed
    /// clear or flush becomes a warning on the outcome and unsent logs stay
    /// buffered.
    pub async fn end_patrol<A: PatrolApi>(
        &mut self,
        api: &A,
        schedule_id: &str,
    ) -> Result<EndPatrolOutcome, ClientError> {
        let schedule = api.end_patrol(schedule_id).await?;
        let mut warnings = Vec::new();

        let location_cleared = match api.clear_patrol_status(schedule_id).await {
            Ok(cleared) => cleared,
            Err(e) => {
                tracing::warn!(error = %e, schedule_id, "Failed to clear patrol status");
                warnings.push(e.user_message());
                false
            }
        };

        let logs_flushed = match self.flush_logs(api, schedule_id).await {
            Ok(flushed) => flushed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    schedule_id,
                    "Failed to save patrol logs; keeping them buffered"
                );
                warnings.push(e.user_message());
                0
            }
        };

        tracing::info!(
            tanod_id = %self.tanod_id,
            schedule_id,
            location_cleared,
            logs_flushed,
            "Patrol ended"
        );

        Ok(EndPatrolOutcome {
            schedule,
            location_cleared,
            logs_flushed,
            logs_pending: self.pending_logs(schedule_id).len(),
            warnings,
        })
    }

    /// Send a schedule's buffered logs. Also usable as a manual retry.
    pub async fn flush_logs<A: PatrolApi>(
        &mut self,
        api: &A,
        schedule_id: &str,
    ) -> Result<usize, ClientError> {
        let pending = self.pending_logs(schedule_id).to_vec();
        if pending.is_empty() {
            return Ok(0);
        }

        api.save_patrol_logs(schedule_id, &pending).await?;

        self.buffer.patrol_logs.remove(schedule_id);
        if let Err(e) = self.persist() {
            // Already on the server; a stale file only risks a duplicate flush
            tracing::warn!(error = %e, "Failed to persist log buffer after flush");
        }
        Ok(pending.len())
    }
}
