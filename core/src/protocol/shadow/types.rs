/*
 * types.rs
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

//! Shadow pipeline message types: decoded values, inbound commands, and
//! outbound events, plus the bounded sink events leave through.

use bytes::BytesMut;
use log::debug;
use tokio::sync::mpsc;

// ── Decoded values ───────────────────────────────────────────────────

/// One entry of the gateway sensor whitelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorWhitelistEntry {
    /// Sensor address string, at most twelve characters.
    pub address: String,
    pub whitelisted: bool,
}

/// One replayed sensor event from a shadow event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEventRecord {
    /// Record type, hex-coded in the document.
    pub record_type: u32,
    /// Event time, decimal seconds since the epoch.
    pub epoch: u32,
    /// Event data word, hex-coded in the document.
    pub data: u32,
}

// ── Commands and events ──────────────────────────────────────────────

/// Commands sent into the shadow pipeline task.
pub enum ShadowCommand {
    /// A publish arrived from the cloud. The payload buffer is mutated
    /// during decoding (metadata truncation).
    Publish { topic: String, payload: BytesMut },
    /// Forward a JSON document to the cloud: per-sensor traffic keeps its
    /// topic, gateway-bound traffic goes to the gateway update topic and is
    /// acknowledged with [`ShadowEvent::ShadowAck`] on success.
    PublishOut {
        topic: String,
        payload: String,
        gateway_bound: bool,
    },
    /// Downstream request to subscribe (or unsubscribe) a topic; answered
    /// through the callback with the outcome.
    Subscribe {
        topic: String,
        subscribe: bool,
        on_complete: Box<dyn FnOnce(bool) + Send>,
    },
    /// The cloud connection came up.
    Connected,
    /// The cloud connection dropped.
    Disconnected,
    /// The initial gateway shadow (get/accepted) has been fully decoded.
    GetAcceptedReceived,
    /// Retry timer fired; re-run the subscription pass.
    RetryTick,
}

/// Events the pipeline emits to the downstream consumer (the sensor task).
#[derive(Debug, PartialEq, Eq)]
pub enum ShadowEvent {
    /// Sensor whitelist decoded from the gateway shadow.
    Whitelist { sensors: Vec<SensorWhitelistEntry> },
    /// Event-log replay decoded from one sensor's shadow; also signals that
    /// the sensor's shadow is initialized, so it fires even with no events.
    ShadowInit {
        address: String,
        events: Vec<SensorEventRecord>,
    },
    /// Configuration command for one sensor, built from a shadow delta.
    /// `config_version` repeats on cloud redelivery; consumers de-duplicate
    /// on it.
    ConfigRequest {
        address: String,
        config_version: u32,
        command: String,
    },
    /// Gateway-bound publish was accepted by the session.
    ShadowAck,
    /// Fully subscribed; the consumer may regenerate the gateway shadow.
    ShadowRequest,
    /// Initial shadow sync is complete.
    ShadowInitComplete,
    Connected,
    Disconnected,
}

// ── EventSink ────────────────────────────────────────────────────────

/// Bounded outbound channel. Emission never blocks: when the consumer is
/// behind, the event is dropped and the cloud's redelivery is the retry.
pub struct EventSink {
    tx: mpsc::Sender<ShadowEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<ShadowEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: ShadowEvent) {
        if let Err(e) = self.tx.try_send(event) {
            debug!("shadow event dropped: {}", e);
        }
    }
}
