/*
 * subscription.rs
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

//! Shadow subscription lifecycle. Three flags drive a level-triggered
//! sequence: subscribe to get/accepted, GET the initial shadow, then — only
//! once that shadow has been consumed — subscribe to the gateway topic.
//! Every retry pass re-checks all three flags from scratch, so a pass is
//! idempotent and a failed broker call is simply tried again on the next
//! tick.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::config::GatewayConfig;
use crate::protocol::shadow::session::CloudSession;

/// What survives a cloud disconnect.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPolicy {
    /// Keep the get/accepted subscription flag and the shadow-processed
    /// flag across a disconnect, so a reconnect resumes directly at the
    /// gateway-topic subscribe. This assumes the broker preserves the
    /// get/accepted subscription across the reconnect; set to false to
    /// restart the whole sequence instead.
    pub preserve_shadow_sync_on_disconnect: bool,
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        SubscriptionPolicy {
            preserve_shadow_sync_on_disconnect: true,
        }
    }
}

/// Where the lifecycle currently stands, derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// Not connected; nothing subscribed yet this session.
    Idle,
    AwaitingGetAcceptedSub,
    AwaitingShadowGet,
    AwaitingGatewaySub,
    /// Fully subscribed.
    Steady,
}

/// Snapshot of the three lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    pub subscribed_to_get_accepted: bool,
    pub get_shadow_processed: bool,
    pub gateway_subscribed: bool,
}

/// Drives the subscription lifecycle against a [`CloudSession`].
///
/// `get_shadow_processed` is the one flag written from the decode side
/// (the get/accepted payload completing) and read by the retry side, so it
/// is an atomic; the other flags live and die on the pipeline task.
pub struct SubscriptionManager {
    connected: bool,
    subscribed_to_get_accepted: bool,
    get_shadow_processed: AtomicBool,
    gateway_subscribed: bool,
    get_accepted_topic: String,
    gateway_topic: String,
    single_topic: bool,
    policy: SubscriptionPolicy,
}

impl SubscriptionManager {
    pub fn new(config: &GatewayConfig) -> Self {
        SubscriptionManager {
            connected: false,
            subscribed_to_get_accepted: false,
            get_shadow_processed: AtomicBool::new(false),
            gateway_subscribed: false,
            get_accepted_topic: config.get_accepted_topic(),
            gateway_topic: config.gateway_topic(),
            single_topic: config.single_topic,
            policy: config.policy,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state(&self) -> SubscriptionState {
        SubscriptionState {
            subscribed_to_get_accepted: self.subscribed_to_get_accepted,
            get_shadow_processed: self.get_shadow_processed.load(Ordering::SeqCst),
            gateway_subscribed: self.gateway_subscribed,
        }
    }

    pub fn phase(&self) -> SubscriptionPhase {
        let state = self.state();
        if !self.connected {
            SubscriptionPhase::Idle
        } else if !state.subscribed_to_get_accepted {
            SubscriptionPhase::AwaitingGetAcceptedSub
        } else if !state.get_shadow_processed {
            SubscriptionPhase::AwaitingShadowGet
        } else if !state.gateway_subscribed {
            SubscriptionPhase::AwaitingGatewaySub
        } else {
            SubscriptionPhase::Steady
        }
    }

    pub fn is_complete(&self) -> bool {
        let state = self.state();
        state.subscribed_to_get_accepted
            && state.get_shadow_processed
            && state.gateway_subscribed
    }

    /// One level-triggered pass over the lifecycle. Operations whose flag is
    /// already set are skipped, so re-running a completed pass touches the
    /// broker not at all. Returns true when fully subscribed; the caller
    /// re-arms the retry timer otherwise.
    pub fn retry(&mut self, session: &dyn CloudSession) -> bool {
        if self.single_topic {
            // Demo mode runs everything over the gateway topic; there is no
            // lifecycle to drive.
            return true;
        }
        if !self.subscribed_to_get_accepted {
            match session.subscribe(&self.get_accepted_topic) {
                Ok(()) => self.subscribed_to_get_accepted = true,
                Err(e) => warn!("get/accepted subscribe failed: {}", e),
            }
        }
        if !self.get_shadow_processed.load(Ordering::SeqCst) {
            if let Err(e) = session.request_shadow() {
                warn!("shadow get request failed: {}", e);
            }
        }
        if self.get_shadow_processed.load(Ordering::SeqCst) && !self.gateway_subscribed {
            match session.subscribe(&self.gateway_topic) {
                Ok(()) => {
                    self.gateway_subscribed = true;
                    session.set_shadow_generation(true);
                }
                Err(e) => warn!("gateway topic subscribe failed: {}", e),
            }
        }
        self.is_complete()
    }

    pub fn handle_connected(&mut self) {
        self.connected = true;
    }

    /// The initial gateway shadow has been fully decoded: drop the
    /// get/accepted subscription, and only once that sticks mark the shadow
    /// as processed so the gateway subscribe can proceed.
    pub fn handle_get_accepted_received(&mut self, session: &dyn CloudSession) {
        match session.unsubscribe(&self.get_accepted_topic) {
            Ok(()) => self.get_shadow_processed.store(true, Ordering::SeqCst),
            Err(e) => warn!("get/accepted unsubscribe failed: {}", e),
        }
    }

    /// Cloud connection dropped. The gateway subscription is always gone;
    /// whether the shadow-sync flags survive is policy.
    pub fn handle_disconnected(&mut self, session: &dyn CloudSession) {
        self.connected = false;
        self.gateway_subscribed = false;
        session.set_shadow_generation(false);
        if !self.policy.preserve_shadow_sync_on_disconnect {
            self.subscribed_to_get_accepted = false;
            self.get_shadow_processed.store(false, Ordering::SeqCst);
        }
        debug!("disconnected; phase now {:?}", self.phase());
    }
}
