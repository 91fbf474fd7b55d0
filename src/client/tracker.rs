// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background location tracking for a signed-in tanod.
//!
//! One watch task at a time consumes position fixes, runs them through the
//! [`LocationSampler`], posts the accepted samples and mirrors them on the
//! realtime channel. Errors are reported on the notice channel and never
//! stop the loop.

use super::api::ApiClient;
use super::error::{ClientError, GeolocationError};
use super::realtime::RealtimeClient;
use super::sampler::{LocationSampler, PatrolContext, PositionFix};
use crate::models::LocationSample;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// One reading from the device's position source.
pub type PositionReading = Result<PositionFix, GeolocationError>;

/// Destination for accepted location samples.
pub trait LocationSink: Send + Sync + 'static {
    fn post(&self, sample: &LocationSample) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl LocationSink for ApiClient {
    async fn post(&self, sample: &LocationSample) -> Result<(), ClientError> {
        self.update_location(sample).await.map(|_| ())
    }
}

pub struct Tracker<S> {
    user_id: String,
    sink: Arc<S>,
    threshold_meters: f64,
    notices: mpsc::UnboundedSender<String>,
    realtime: Option<RealtimeClient>,
    watch: Option<JoinHandle<()>>,
}

impl<S: LocationSink> Tracker<S> {
    /// `notices` receives user-facing messages for errors.
    pub fn new(
        user_id: impl Into<String>,
        sink: Arc<S>,
        threshold_meters: f64,
        notices: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            sink,
            threshold_meters,
            notices,
            realtime: None,
            watch: None,
        }
    }

    /// Mirror samples on this realtime connection. The tracker closes it on
    /// [`Tracker::stop`].
    pub fn attach_realtime(&mut self, client: RealtimeClient) {
        self.realtime = Some(client);
    }

    /// Start consuming position readings, replacing any running watch.
    pub fn start(
        &mut self,
        positions: mpsc::Receiver<PositionReading>,
        context: watch::Receiver<PatrolContext>,
    ) {
        if let Some(previous) = self.watch.take() {
            previous.abort();
            tracing::debug!(user_id = %self.user_id, "Replaced running location watch");
        }

        let sampler = LocationSampler::new(self.user_id.clone(), self.threshold_meters);
        self.watch = Some(tokio::spawn(run_watch(
            sampler,
            positions,
            context,
            self.sink.clone(),
            self.realtime.clone(),
            self.notices.clone(),
        )));
        tracing::info!(user_id = %self.user_id, "Location tracking started");
    }

    /// Stop the watch and close the realtime connection, if any.
    pub fn stop(&mut self) {
        if let Some(handle) = self.watch.take() {
            handle.abort();
        }
        if let Some(realtime) = self.realtime.take() {
            realtime.close();
        }
        tracing::info!(user_id = %self.user_id, "Location tracking stopped");
    }

    pub fn is_running(&self) -> bool {
        self.watch.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<S> Drop for Tracker<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.watch.take() {
            handle.abort();
        }
    }
}

async fn run_watch<S: LocationSink>(
    mut sampler: LocationSampler,
    mut positions: mpsc::Receiver<PositionReading>,
    context: watch::Receiver<PatrolContext>,
    sink: Arc<S>,
    realtime: Option<RealtimeClient>,
    notices: mpsc::UnboundedSender<String>,
) {
    while let Some(reading) = positions.recv().await {
        let fix = match reading {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!(error = %e, "Position unavailable");
                let _ = notices.send(e.user_message());
                continue;
            }
        };

        let current = context.borrow().clone();
        let Some(sample) = sampler.observe(&fix, &current, Utc::now()) else {
            continue;
        };

        if let Err(e) = sink.post(&sample).await {
            tracing::warn!(error = %e, user_id = %sample.user_id, "Failed to post location");
            let _ = notices.send(e.user_message());
            // The server does not have this sample; send the next fix as-is
            sampler.invalidate();
            continue;
        }

        if let Some(realtime) = &realtime {
            if let Err(e) = realtime.mirror_location(&sample) {
                tracing::debug!(error = %e, "Location mirror skipped");
            }
        }
    }

    tracing::debug!("Position source closed");
}
