/*
 * decoder.rs
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

//! Shadow document decoders. Each decoder re-walks the token array from the
//! document root and emits at most one typed event; none share cursor state.
//! A cloud document is allowed to be partial, reordered, or garbled — the
//! decoders extract what is there and drop the rest.

use bytes::BytesMut;
use log::{debug, error, info};

use crate::config::{EVENT_LOG_SIZE, SENSOR_TABLE_SIZE};
use crate::json::{
    decimal_u32, find, hex_u32, primitive_bool, scan, token_str, truncate_metadata, Cursor,
    PathStep, TokenBuffer, TokenKind,
};
use crate::protocol::shadow::fota::{FotaImage, FotaRegistry};
use crate::protocol::shadow::topic;
use crate::protocol::shadow::topic::SENSOR_ADDR_LEN;
use crate::protocol::shadow::types::{
    EventSink, SensorEventRecord, SensorWhitelistEntry, ShadowEvent,
};

/// Wrapper turning a raw shadow `state` fragment into a sensor set command.
/// The fragment is spliced in byte-for-byte, never re-serialized.
pub const SENSOR_CMD_SET_PREFIX: &str = "{\"jsonrpc\": \"2.0\", \"method\": \"set\", \"params\": ";
pub const SENSOR_CMD_SUFFIX: &str = ", \"id\": 1}";

/// Elements of the anonymous whitelist/event-log tuples.
const TUPLE_LEN: usize = 3;

/// One tokenized shadow payload plus the topic-derived document shape:
/// get/accepted responses wrap everything in an extra `reported` level.
pub struct ShadowDocument<'a> {
    pub(crate) buf: &'a TokenBuffer,
    pub(crate) src: &'a [u8],
    pub(crate) get_accepted: bool,
}

impl<'a> ShadowDocument<'a> {
    pub fn new(buf: &'a TokenBuffer, src: &'a [u8], get_accepted: bool) -> Self {
        ShadowDocument {
            buf,
            src,
            get_accepted,
        }
    }

    /// Plan prefix down to the reported state: `state` always, `reported`
    /// only in get/accepted documents (deltas arrive unwrapped).
    pub(crate) fn state_steps(&self) -> Vec<PathStep<'static>> {
        let mut steps = vec![PathStep::new("state", TokenKind::Object)];
        if self.get_accepted {
            steps.push(PathStep::new("reported", TokenKind::Object));
        }
        steps
    }

    /// Shape check for one anonymous 3-tuple at token `i`: an array of
    /// exactly three childless scalars of the given kinds.
    fn tuple3(&self, i: usize, kinds: [TokenKind; 3]) -> bool {
        let toks = self.buf.tokens();
        toks[i].kind == TokenKind::Array
            && toks[i].size == TUPLE_LEN
            && toks[i + 1].kind == kinds[0]
            && toks[i + 1].size == 0
            && toks[i + 2].kind == kinds[1]
            && toks[i + 2].size == 0
            && toks[i + 3].kind == kinds[2]
            && toks[i + 3].size == 0
    }

    /// Decode the gateway sensor whitelist:
    /// `state[.reported].bt510.sensors` holding `[address, epoch, bool]`
    /// tuples (the epoch is not used). Emits whenever the array is found,
    /// even empty; a malformed element stops decoding and the valid prefix
    /// is still emitted.
    pub fn decode_whitelist(&self, sink: &EventSink) {
        let mut steps = self.state_steps();
        steps.push(PathStep::new("bt510", TokenKind::Object));
        steps.push(PathStep::new("sensors", TokenKind::Array));
        let found = match crate::json::walk(self.buf, self.src, &steps) {
            Some(f) => f,
            None => {
                // Normal before the gateway has talked to any sensor.
                debug!("sensor whitelist array not present");
                return;
            }
        };
        let toks = self.buf.tokens();
        let declared = toks[found.value].size;
        let max = declared.min(SENSOR_TABLE_SIZE);
        let mut sensors = Vec::with_capacity(max);
        let mut i = found.cursor.pos;
        while i + TUPLE_LEN < toks.len() && sensors.len() < max {
            if !self.tuple3(
                i,
                [TokenKind::String, TokenKind::Primitive, TokenKind::Primitive],
            ) {
                error!(
                    "gateway shadow whitelist truncated at element {}",
                    sensors.len()
                );
                break;
            }
            let address = token_str(self.src, &toks[i + 1]);
            let address = address.get(..SENSOR_ADDR_LEN).unwrap_or(address);
            sensors.push(SensorWhitelistEntry {
                address: address.to_string(),
                whitelisted: primitive_bool(self.src, &toks[i + 3]),
            });
            i += TUPLE_LEN + 1;
        }
        info!(
            "processed {} of {} sensors in desired list",
            sensors.len(),
            declared
        );
        sink.emit(ShadowEvent::Whitelist { sensors });
    }

    /// Decode one sensor's delta document into a set command. Both the
    /// `state` object and the top-level `configVersion` must be present;
    /// otherwise the delta is dropped without comment — duplicates and
    /// partial deltas are expected cloud behavior.
    pub fn decode_delta(&self, topic_str: &str, sink: &EventSink) {
        let state = find(
            self.buf,
            self.src,
            Cursor::root(),
            "state",
            TokenKind::Object,
        );
        let version = find(
            self.buf,
            self.src,
            Cursor::root(),
            "configVersion",
            TokenKind::Primitive,
        );
        let (state, version) = match (state, version) {
            (Some(s), Some(v)) => (s, v),
            _ => return,
        };
        let address = match topic::sensor_address(topic_str) {
            Some(a) => a.to_string(),
            None => {
                debug!("delta on topic without sensor address: {}", topic_str);
                return;
            }
        };
        let toks = self.buf.tokens();
        let state_tok = &toks[state.value];
        let raw = self.src.get(state_tok.start..state_tok.end).unwrap_or(b"");
        let command = format!(
            "{}{}{}",
            SENSOR_CMD_SET_PREFIX,
            String::from_utf8_lossy(raw),
            SENSOR_CMD_SUFFIX
        );
        sink.emit(ShadowEvent::ConfigRequest {
            address,
            config_version: decimal_u32(self.src, &toks[version.value]),
            command,
        });
    }

    /// Decode one sensor's event log: `state.reported.eventLog` holding
    /// `[hex record type, decimal epoch, hex data]` tuples. Every step is
    /// anchored — shadow documents repeat the `eventLog` key in timestamp
    /// blocks, so an unanchored match could land in the wrong object.
    /// Always emits, even with the array absent: the replay message doubles
    /// as the sensor's shadow-init signal.
    pub fn decode_event_log(&self, topic_str: &str, sink: &EventSink) {
        let address = match topic::sensor_address(topic_str) {
            Some(a) => a.to_string(),
            None => {
                error!("sensor shadow on topic without address: {}", topic_str);
                return;
            }
        };
        let steps = [
            PathStep::new("state", TokenKind::Object),
            PathStep::new("reported", TokenKind::Object),
            PathStep::new("eventLog", TokenKind::Array),
        ];
        let toks = self.buf.tokens();
        let mut events = Vec::new();
        let mut declared = 0;
        if let Some(found) = crate::json::walk(self.buf, self.src, &steps) {
            declared = toks[found.value].size;
            let max = declared.min(EVENT_LOG_SIZE);
            let mut i = found.cursor.pos;
            while i + TUPLE_LEN < toks.len() && events.len() < max {
                if !self.tuple3(i, [TokenKind::String, TokenKind::Primitive, TokenKind::String])
                {
                    error!(
                        "sensor shadow event log truncated at record {}",
                        events.len()
                    );
                    break;
                }
                events.push(SensorEventRecord {
                    record_type: hex_u32(self.src, &toks[i + 1]),
                    epoch: decimal_u32(self.src, &toks[i + 2]),
                    data: hex_u32(self.src, &toks[i + 3]),
                });
                i += TUPLE_LEN + 1;
            }
        } else {
            debug!("event log not present in sensor shadow");
        }
        info!(
            "processed {} of {} sensor events in shadow",
            events.len(),
            declared
        );
        sink.emit(ShadowEvent::ShadowInit { address, events });
    }
}

/// Decode one cloud publish. Gateway-topic payloads run the whitelist and
/// all FOTA decoders; per-sensor payloads run the event-log decoder for
/// get/accepted responses and the delta decoder otherwise. Returns true
/// when the payload was the gateway's get/accepted response and the
/// subscription machinery should be told the initial shadow is consumed.
///
/// The payload buffer is mutated (metadata truncation). An unusable scan
/// drops the whole payload; nothing partial is extracted.
pub fn handle_publish(
    topic_str: &str,
    payload: &mut BytesMut,
    fota: &dyn FotaRegistry,
    sink: &EventSink,
) -> bool {
    truncate_metadata(payload);
    let buf = match scan(&payload[..]) {
        Ok(b) if b.root_is_object() => b,
        Ok(_) => {
            error!("shadow payload root is not an object");
            return false;
        }
        Err(e) => {
            error!("unable to tokenize shadow payload: {}", e);
            return false;
        }
    };
    let get_accepted = topic::is_get_accepted(topic_str);
    let doc = ShadowDocument::new(&buf, &payload[..], get_accepted);
    if topic::is_gateway(topic_str) {
        doc.decode_whitelist(sink);
        doc.decode_fota(FotaImage::App, fota);
        doc.decode_fota(FotaImage::Modem, fota);
        doc.decode_fota_host(fota);
        doc.decode_fota_block_size(fota);
        get_accepted
    } else if get_accepted {
        doc.decode_event_log(topic_str, sink);
        false
    } else {
        doc.decode_delta(topic_str, sink);
        false
    }
}
