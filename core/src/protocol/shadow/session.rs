/*
 * session.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pontile, a cellular IoT sensor gateway.
 *
 * Pontile is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! CloudSession trait: the broker-facing operations the shadow core drives
//! but does not implement (the cellular/MQTT layer provides them).

use std::fmt;

/// Error from a cloud session operation.
#[derive(Debug)]
pub struct SessionError {
    message: String,
}

impl SessionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}

/// Operations on the established cloud connection. One per gateway;
/// implemented by the transport layer, called from the shadow pipeline task.
pub trait CloudSession: Send + Sync {
    /// Subscribe to a topic. An error leaves the corresponding subscription
    /// flag unset; the retry timer will try again.
    fn subscribe(&self, topic: &str) -> Result<(), SessionError>;

    /// Unsubscribe from a topic.
    fn unsubscribe(&self, topic: &str) -> Result<(), SessionError>;

    /// Request the full gateway shadow document. The response arrives
    /// asynchronously as a publish on the get/accepted topic.
    fn request_shadow(&self) -> Result<(), SessionError>;

    /// Publish a JSON document to a topic.
    fn publish(&self, topic: &str, payload: &str) -> Result<(), SessionError>;

    /// Enable or disable periodic gateway shadow generation downstream.
    /// Only meaningful while fully subscribed; disabled on disconnect.
    fn set_shadow_generation(&self, enabled: bool);
}
