/*
 * config.rs
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

//! Gateway configuration: the cloud thing identity, the shadow topic strings
//! derived from it, retry pacing, and the fixed capacities of the decode
//! path.

use std::time::Duration;

use crate::protocol::shadow::SubscriptionPolicy;

/// Hard ceiling on tokens per payload. Shadow documents that need more are
/// dropped whole; `metadata` truncation keeps well-formed ones under this.
pub const TOKEN_CEILING: usize = 256;

/// Most sensors decoded from one whitelist document (the sensor table size).
pub const SENSOR_TABLE_SIZE: usize = 32;

/// Most event-log records decoded from one sensor shadow.
pub const EVENT_LOG_SIZE: usize = 32;

/// Depth of the outbound event channel. A full channel drops events; the
/// cloud redelivers shadow state, so nothing here needs backpressure.
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Configuration for one gateway's shadow pipeline.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Cloud thing name, `deviceId-<id>`. The `deviceId-` marker is what
    /// distinguishes gateway shadow topics from per-sensor ones.
    pub thing_name: String,
    /// Delay before re-running an incomplete subscription pass.
    pub retry_delay: Duration,
    /// Demo mode: publish everything to the gateway update topic and skip
    /// the subscription machinery entirely.
    pub single_topic: bool,
    pub policy: SubscriptionPolicy,
}

impl GatewayConfig {
    /// Configuration for the gateway identified by `device_id` (typically
    /// the modem IMEI).
    pub fn new(device_id: &str) -> Self {
        GatewayConfig {
            thing_name: format!("deviceId-{}", device_id),
            retry_delay: Duration::from_secs(1),
            single_topic: false,
            policy: SubscriptionPolicy::default(),
        }
    }

    /// Topic the gateway publishes shadow updates to.
    pub fn update_topic(&self) -> String {
        format!("$aws/things/{}/shadow/update", self.thing_name)
    }

    /// Topic delivering accepted gateway shadow updates; the subscription
    /// held while in steady state.
    pub fn gateway_topic(&self) -> String {
        format!("$aws/things/{}/shadow/update/accepted", self.thing_name)
    }

    /// Topic a shadow GET request is published to.
    pub fn get_topic(&self) -> String {
        format!("$aws/things/{}/shadow/get", self.thing_name)
    }

    /// Topic delivering the full shadow document after a GET.
    pub fn get_accepted_topic(&self) -> String {
        format!("$aws/things/{}/shadow/get/accepted", self.thing_name)
    }
}
