/*
 * topic.rs
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

//! Shadow topic classification. Topics look like
//! `$aws/things/<thing>/shadow/...`; the gateway's own thing name carries
//! the `deviceId-` marker, per-sensor things are bare sensor addresses.

/// Prefix of every shadow topic.
pub const SHADOW_PREFIX: &str = "$aws/things/";

/// Substring identifying the gateway's own shadow topics.
pub const GATEWAY_MARKER: &str = "deviceId-";

/// Suffix of topics delivering a full shadow document after a GET.
pub const GET_ACCEPTED_SUFFIX: &str = "/get/accepted";

/// Length of a sensor address string (six hex octets).
pub const SENSOR_ADDR_LEN: usize = 12;

/// True for topics belonging to the gateway's own shadow.
pub fn is_gateway(topic: &str) -> bool {
    topic.contains(GATEWAY_MARKER)
}

/// True for get/accepted response topics.
pub fn is_get_accepted(topic: &str) -> bool {
    topic.contains(GET_ACCEPTED_SUFFIX)
}

/// The sensor address embedded in a per-sensor shadow topic, or `None` when
/// the topic does not carry one.
pub fn sensor_address(topic: &str) -> Option<&str> {
    let rest = topic.strip_prefix(SHADOW_PREFIX)?;
    rest.get(..SENSOR_ADDR_LEN)
}
