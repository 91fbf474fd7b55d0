// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Realtime broadcast channel: room-scoped fan-out of tracking and
//! resource events to connected admin and tanod clients.

pub mod hub;
pub mod messages;
pub mod session;

pub use hub::Hub;
pub use messages::{ClientMessage, Room, ServerEvent};
pub use session::run_session;
