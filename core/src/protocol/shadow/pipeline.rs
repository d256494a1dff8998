/*
 * pipeline.rs
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

//! Shadow pipeline: one tokio task owns the decoders and the subscription
//! manager, draining a command channel. Commands queue via a cheaply
//! cloneable handle; one payload's scan-plus-decode always completes before
//! the next command runs, so concurrent publishes serialize naturally.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::config::{GatewayConfig, EVENT_QUEUE_DEPTH};
use crate::protocol::shadow::decoder;
use crate::protocol::shadow::fota::FotaRegistry;
use crate::protocol::shadow::session::CloudSession;
use crate::protocol::shadow::subscription::SubscriptionManager;
use crate::protocol::shadow::types::{EventSink, ShadowCommand, ShadowEvent};

/// Handle to the shadow pipeline task. Cheaply cloneable.
#[derive(Clone)]
pub struct ShadowPipeline {
    command_tx: mpsc::UnboundedSender<ShadowCommand>,
}

impl ShadowPipeline {
    /// Spawn the pipeline task. Returns the command handle and the bounded
    /// event channel the downstream consumer drains.
    pub fn start(
        config: GatewayConfig,
        session: Arc<dyn CloudSession>,
        fota: Arc<dyn FotaRegistry>,
    ) -> (Self, mpsc::Receiver<ShadowEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let pipeline = ShadowPipeline {
            command_tx: command_tx.clone(),
        };
        tokio::spawn(run_pipeline(
            config,
            session,
            fota,
            command_tx,
            command_rx,
            EventSink::new(event_tx),
        ));
        (pipeline, event_rx)
    }

    pub fn send(&self, command: ShadowCommand) {
        let _ = self.command_tx.send(command);
    }

    pub fn is_alive(&self) -> bool {
        !self.command_tx.is_closed()
    }
}

async fn run_pipeline(
    config: GatewayConfig,
    session: Arc<dyn CloudSession>,
    fota: Arc<dyn FotaRegistry>,
    command_tx: mpsc::UnboundedSender<ShadowCommand>,
    mut command_rx: mpsc::UnboundedReceiver<ShadowCommand>,
    sink: EventSink,
) {
    let mut subs = SubscriptionManager::new(&config);
    let mut retry_armed = false;
    while let Some(command) = command_rx.recv().await {
        match command {
            ShadowCommand::Publish { topic, mut payload } => {
                let consumed =
                    decoder::handle_publish(&topic, &mut payload, fota.as_ref(), &sink);
                if consumed {
                    // The initial gateway shadow is in; the lifecycle can
                    // drop the get/accepted subscription.
                    let _ = command_tx.send(ShadowCommand::GetAcceptedReceived);
                }
            }
            ShadowCommand::PublishOut {
                topic,
                payload,
                gateway_bound,
            } => {
                let target = if gateway_bound || config.single_topic {
                    config.update_topic()
                } else {
                    topic
                };
                match session.publish(&target, &payload) {
                    Ok(()) if gateway_bound => sink.emit(ShadowEvent::ShadowAck),
                    Ok(()) => {}
                    // Sensor data is disposable; the next reading replaces it.
                    Err(e) => debug!("dropped publish to {}: {}", target, e),
                }
            }
            ShadowCommand::Subscribe {
                topic,
                subscribe,
                on_complete,
            } => {
                let result = if subscribe {
                    session.subscribe(&topic)
                } else {
                    session.unsubscribe(&topic)
                };
                if let Err(ref e) = result {
                    warn!("requested (un)subscribe of {} failed: {}", topic, e);
                }
                on_complete(result.is_ok());
            }
            ShadowCommand::Connected => {
                subs.handle_connected();
                sink.emit(ShadowEvent::Connected);
                if !retry_armed {
                    retry_armed = subscription_pass(&config, &mut subs, &session, &sink, &command_tx);
                }
            }
            ShadowCommand::Disconnected => {
                subs.handle_disconnected(session.as_ref());
                sink.emit(ShadowEvent::Disconnected);
            }
            ShadowCommand::GetAcceptedReceived => {
                let was_processed = subs.state().get_shadow_processed;
                subs.handle_get_accepted_received(session.as_ref());
                if !was_processed && subs.state().get_shadow_processed {
                    sink.emit(ShadowEvent::ShadowInitComplete);
                }
            }
            ShadowCommand::RetryTick => {
                retry_armed = false;
                if subs.is_connected() {
                    retry_armed = subscription_pass(&config, &mut subs, &session, &sink, &command_tx);
                }
            }
        }
    }
}

/// One subscription pass. A completed pass nudges the consumer to regenerate
/// the gateway shadow; an incomplete one re-arms the retry timer. Returns
/// whether the timer is armed.
fn subscription_pass(
    config: &GatewayConfig,
    subs: &mut SubscriptionManager,
    session: &Arc<dyn CloudSession>,
    sink: &EventSink,
    command_tx: &mpsc::UnboundedSender<ShadowCommand>,
) -> bool {
    if subs.retry(session.as_ref()) {
        if !config.single_topic {
            sink.emit(ShadowEvent::ShadowRequest);
        }
        false
    } else {
        let tx = command_tx.clone();
        let delay = config.retry_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ShadowCommand::RetryTick);
        });
        true
    }
}
