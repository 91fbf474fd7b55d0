// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile lookup)
//! - Patrol areas and schedules (hydrated on write)
//! - Last-known locations (one document per user)
//! - Incidents and assistance requests
//! - Patrol logs (appended per schedule)
//!
//! Mutations that must re-check state run their closure while holding the
//! entry's write lock, so the check and the write cannot interleave with
//! another writer on the same document.

use crate::models::{
    AssistanceRequest, IncidentReport, IncidentStatus, LocationSample, PatrolArea, PatrolAreaRef,
    PatrolLogEntry, PatrolSchedule, UserProfile,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared handle to the store. Cloning is cheap.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Collections>,
}

#[derive(Default)]
struct Collections {
    users: DashMap<String, UserProfile>,
    patrol_areas: DashMap<String, PatrolArea>,
    schedules: DashMap<String, PatrolSchedule>,
    locations: DashMap<String, LocationSample>,
    incidents: DashMap<String, IncidentReport>,
    /// Keyed by incident ID (one request per incident)
    assistance_requests: DashMap<String, AssistanceRequest>,
    patrol_logs: DashMap<String, Vec<PatrolLogEntry>>,
    /// Tanod ID → incident the tanod is responding to
    responders: DashMap<String, String>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    pub fn get_user(&self, user_id: &str) -> Option<UserProfile> {
        self.inner.users.get(user_id).map(|u| u.clone())
    }

    pub fn upsert_user(&self, user: UserProfile) {
        self.inner.users.insert(user.id.clone(), user);
    }

    // ─── Patrol Area Operations ──────────────────────────────────

    pub fn get_patrol_area(&self, area_id: &str) -> Option<PatrolArea> {
        self.inner.patrol_areas.get(area_id).map(|a| a.clone())
    }

    pub fn list_patrol_areas(&self) -> Vec<PatrolArea> {
        let mut areas: Vec<PatrolArea> = self
            .inner
            .patrol_areas
            .iter()
            .map(|a| a.value().clone())
            .collect();
        areas.sort_by(|a, b| a.id.cmp(&b.id));
        areas
    }

    /// Store an area and re-hydrate schedules that referenced it by ID.
    pub fn upsert_patrol_area(&self, area: PatrolArea) {
        for mut schedule in self.inner.schedules.iter_mut() {
            let references = schedule
                .patrol_area
                .as_ref()
                .is_some_and(|r| r.area_id() == area.id);
            if references {
                schedule.patrol_area = Some(PatrolAreaRef::Resolved(area.clone()));
            }
        }
        self.inner.patrol_areas.insert(area.id.clone(), area);
    }

    // ─── Schedule Operations ─────────────────────────────────────

    /// Store a schedule, resolving an area ID reference to the full area.
    pub fn upsert_schedule(&self, mut schedule: PatrolSchedule) {
        schedule.patrol_area = schedule.patrol_area.map(|r| self.hydrate(r));
        self.inner.schedules.insert(schedule.id.clone(), schedule);
    }

    fn hydrate(&self, reference: PatrolAreaRef) -> PatrolAreaRef {
        match reference {
            PatrolAreaRef::Id(id) => match self.get_patrol_area(&id) {
                Some(area) => PatrolAreaRef::Resolved(area),
                None => {
                    tracing::warn!(area_id = %id, "Schedule references unknown patrol area");
                    PatrolAreaRef::Id(id)
                }
            },
            resolved => resolved,
        }
    }

    pub fn get_schedule(&self, schedule_id: &str) -> Option<PatrolSchedule> {
        self.inner.schedules.get(schedule_id).map(|s| s.clone())
    }

    /// All schedules, ordered by start time.
    pub fn list_schedules(&self) -> Vec<PatrolSchedule> {
        let mut schedules: Vec<PatrolSchedule> = self
            .inner
            .schedules
            .iter()
            .map(|s| s.value().clone())
            .collect();
        schedules.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        schedules
    }

    /// Schedules a tanod is assigned to, ordered by start time.
    pub fn schedules_for_tanod(&self, tanod_id: &str) -> Vec<PatrolSchedule> {
        self.list_schedules()
            .into_iter()
            .filter(|s| s.is_assigned(tanod_id))
            .collect()
    }

    /// Run `f` against a schedule under its write lock.
    ///
    /// Returns `None` if the schedule does not exist.
    pub fn update_schedule<T, E>(
        &self,
        schedule_id: &str,
        f: impl FnOnce(&mut PatrolSchedule) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let mut schedule = self.inner.schedules.get_mut(schedule_id)?;
        Some(f(schedule.value_mut()))
    }

    // ─── Location Operations ─────────────────────────────────────

    /// Replace the user's last-known location.
    ///
    /// Samples not newer than the stored one are ignored; returns whether
    /// the sample was applied.
    pub fn upsert_location(&self, sample: LocationSample) -> bool {
        match self.inner.locations.entry(sample.user_id.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().last_update >= sample.last_update {
                    return false;
                }
                existing.insert(sample);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(sample);
                true
            }
        }
    }

    pub fn get_location(&self, user_id: &str) -> Option<LocationSample> {
        self.inner.locations.get(user_id).map(|l| l.clone())
    }

    pub fn list_locations(&self) -> Vec<LocationSample> {
        let mut locations: Vec<LocationSample> = self
            .inner
            .locations
            .iter()
            .map(|l| l.value().clone())
            .collect();
        locations.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        locations
    }

    /// Run `f` against a user's location record under its write lock.
    pub fn update_location<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut LocationSample) -> T,
    ) -> Option<T> {
        let mut location = self.inner.locations.get_mut(user_id)?;
        Some(f(location.value_mut()))
    }

    // ─── Incident Operations ─────────────────────────────────────

    pub fn insert_incident(&self, incident: IncidentReport) {
        self.inner.incidents.insert(incident.id.clone(), incident);
    }

    pub fn get_incident(&self, incident_id: &str) -> Option<IncidentReport> {
        self.inner.incidents.get(incident_id).map(|i| i.clone())
    }

    /// All incidents, newest first.
    pub fn list_incidents(&self) -> Vec<IncidentReport> {
        let mut incidents: Vec<IncidentReport> = self
            .inner
            .incidents
            .iter()
            .map(|i| i.value().clone())
            .collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        incidents
    }

    /// The incident a tanod is currently responding to, if any.
    ///
    /// Must not be called while holding an incident entry lock.
    pub fn active_incident_for(&self, tanod_id: &str) -> Option<IncidentReport> {
        self.inner
            .incidents
            .iter()
            .find(|i| i.status == IncidentStatus::InProgress && i.is_held_by(tanod_id))
            .map(|i| i.value().clone())
    }

    /// Run `f` against an incident under its write lock.
    pub fn update_incident<T, E>(
        &self,
        incident_id: &str,
        f: impl FnOnce(&mut IncidentReport) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let mut incident = self.inner.incidents.get_mut(incident_id)?;
        Some(f(incident.value_mut()))
    }

    // ─── Responder Slots ─────────────────────────────────────────

    /// Reserve the tanod's single responder slot for an incident.
    ///
    /// Succeeds if the slot is free or already held for this incident.
    /// Otherwise returns the ID of the incident holding it.
    pub fn reserve_responder(&self, tanod_id: &str, incident_id: &str) -> Result<(), String> {
        match self.inner.responders.entry(tanod_id.to_string()) {
            Entry::Occupied(held) if held.get().as_str() != incident_id => Err(held.get().clone()),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(incident_id.to_string());
                Ok(())
            }
        }
    }

    /// Free the tanod's slot if it is still held for `incident_id`.
    pub fn release_responder(&self, tanod_id: &str, incident_id: &str) {
        self.inner
            .responders
            .remove_if(tanod_id, |_, held| held.as_str() == incident_id);
    }

    // ─── Assistance Operations ───────────────────────────────────

    /// Insert a request unless one already exists for the incident.
    ///
    /// Returns `false` if a request was already present.
    pub fn insert_assistance_request(&self, request: AssistanceRequest) -> bool {
        match self
            .inner
            .assistance_requests
            .entry(request.incident_id.clone())
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(request);
                true
            }
        }
    }

    pub fn get_assistance_request(&self, incident_id: &str) -> Option<AssistanceRequest> {
        self.inner
            .assistance_requests
            .get(incident_id)
            .map(|r| r.clone())
    }

    pub fn update_assistance_request<T, E>(
        &self,
        incident_id: &str,
        f: impl FnOnce(&mut AssistanceRequest) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let mut request = self.inner.assistance_requests.get_mut(incident_id)?;
        Some(f(request.value_mut()))
    }

    // ─── Patrol Log Operations ───────────────────────────────────

    /// Append flushed logs for a schedule; returns the new total.
    pub fn append_patrol_logs(&self, schedule_id: &str, logs: Vec<PatrolLogEntry>) -> usize {
        let mut stored = self
            .inner
            .patrol_logs
            .entry(schedule_id.to_string())
            .or_default();
        stored.extend(logs);
        stored.len()
    }

    pub fn get_patrol_logs(&self, schedule_id: &str) -> Vec<PatrolLogEntry> {
        self.inner
            .patrol_logs
            .get(schedule_id)
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}
