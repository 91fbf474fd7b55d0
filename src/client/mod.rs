// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-side tracking client.
//!
//! What a tanod's device runs during a session: the API client, the
//! location sampler and tracker, the patrol session with its log buffer,
//! and the realtime connection. The admin map's [`LocationFeed`] lives here
//! too.

pub mod api;
pub mod error;
pub mod feed;
pub mod realtime;
pub mod sampler;
pub mod session;
pub mod tracker;

pub use api::ApiClient;
pub use error::{ClientError, GeolocationError};
pub use feed::LocationFeed;
pub use realtime::{Connection, ConnectionState, Connector, HubConnector, RealtimeClient};
pub use sampler::{has_location_changed, LocationSampler, PatrolContext, PositionFix};
pub use session::{EndPatrolOutcome, PatrolApi, PatrolSession};
pub use tracker::{LocationSink, PositionReading, Tracker};
