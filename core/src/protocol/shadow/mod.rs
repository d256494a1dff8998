/*
 * mod.rs
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

//! Device shadow protocol: document decoders, FOTA patching, topic
//! classification, and the subscription lifecycle, all driven by one
//! pipeline task.

mod decoder;
mod fota;
mod pipeline;
mod session;
mod subscription;
pub mod topic;
mod types;

pub use decoder::{
    handle_publish, ShadowDocument, SENSOR_CMD_SET_PREFIX, SENSOR_CMD_SUFFIX,
};
pub use fota::{FotaImage, FotaRegistry};
pub use pipeline::ShadowPipeline;
pub use session::{CloudSession, SessionError};
pub use subscription::{
    SubscriptionManager, SubscriptionPhase, SubscriptionPolicy, SubscriptionState,
};
pub use types::{
    EventSink, SensorEventRecord, SensorWhitelistEntry, ShadowCommand, ShadowEvent,
};
